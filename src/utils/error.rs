//! Error handling for the Crux compiler

use crate::utils::Position;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
///
/// Only the failures that cut a pass short live here. Recoverable problems
/// (unresolved names, type errors) are rendered straight into the owning
/// pass's diagnostic buffer instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Symbol Errors ====================

    #[error("Symbol {name} being redeclared.")]
    Redeclaration { name: String },

    #[error("Could not find {name}.")]
    SymbolNotFound { name: String },

    // ==================== Parser Errors ====================

    /// A failed `expect`; unwinds the whole parse.
    #[error("{message}")]
    QuitParse { message: String, position: Position },

    // ==================== Backend Errors ====================

    #[error("{0}")]
    CodeGen(String),
}
