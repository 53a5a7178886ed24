//! Crux Compiler
//!
//! Compiles the Crux teaching language to MIPS assembly. The pipeline is
//! lexer, parser (with symbol resolution), type checker and code generator;
//! each pass keeps its own diagnostic report.

pub mod backend;
pub mod frontend;
pub mod stdlib;
pub mod types;
pub mod utils;
