//! Standard library - built-in functions

pub mod builtins;

pub use builtins::{BuiltinFunc, BuiltinRegistry};
