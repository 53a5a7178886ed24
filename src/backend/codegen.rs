//! Code Generation trait - Backend abstraction
//!
//! A backend lowers a type-checked tree into a target program. Generation
//! either completes or stops at the first construct it cannot lower.

use crate::frontend::ast::Node;

/// Code generation backend trait
pub trait CodeGen {
    /// Lower the tree rooted at `root`; true when code was generated
    fn generate(&mut self, root: &Node) -> bool;

    fn has_error(&self) -> bool;

    fn error_report(&self) -> String;

    /// Get the backend name
    fn name(&self) -> &str;
}
