//! MIPS backend
//!
//! Targets MIPS32 as accepted by the SPIM and MARS simulators. Every
//! expression leaves exactly one word on the stack.

pub mod activation;
pub mod codegen;
pub mod program;

pub use activation::ActivationRecord;
pub use codegen::MipsCodeGen;
pub use program::Program;
