//! Frontend module - Lexer, Parser, Symbol Resolution, Type Checking

pub mod token;
pub mod lexer;
pub mod symbol;
pub mod ast;
pub mod parser;
pub mod semantic;
pub mod printer;

pub use lexer::Lexer;
pub use parser::Parser;
pub use semantic::{TypeChecker, TypeMap};
