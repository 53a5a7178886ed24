//! Symbols and the scope stack
//!
//! A [`SymbolTable`] is a stack of scopes. The outermost scope holds the
//! built-in functions and the program's global declarations; each function
//! body, if/else block and while body pushes one more.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::stdlib::BuiltinRegistry;
use crate::types::Type;
use crate::utils::{Error, Result};

/// Identity of a declared symbol, distinct even for shadowed names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

/// A declared name
#[derive(Debug)]
pub struct Symbol {
    id: SymbolId,
    name: String,
    ty: OnceCell<Type>,
}

/// Shared handle to a symbol; AST leaves hold these
pub type SymbolRef = Rc<Symbol>;

impl Symbol {
    fn new(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ty: OnceCell::new(),
        }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type; an error type while still undeclared
    pub fn ty(&self) -> Type {
        match self.ty.get() {
            Some(ty) => ty.clone(),
            None => Type::error(format!("Symbol {} has no type.", self.name)),
        }
    }

    /// Attach the declared type. Only the first call has any effect.
    pub fn set_type(&self, ty: Type) -> bool {
        self.ty.set(ty).is_ok()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty.get() {
            Some(ty) => write!(f, "Symbol({}:{})", self.name, ty),
            None => write!(f, "Symbol({})", self.name),
        }
    }
}

/// One lexical scope
#[derive(Debug, Default)]
struct Scope {
    symbols: IndexMap<String, SymbolRef>,
}

/// The scope stack
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    next_id: usize,
}

impl SymbolTable {
    /// A table with a single, empty, outermost scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            next_id: 0,
        }
    }

    /// A table whose outermost scope holds the built-in functions
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for builtin in BuiltinRegistry::new().all() {
            if let Ok(symbol) = table.declare(builtin.name) {
                symbol.set_type(builtin.func_type());
            }
        }
        table
    }

    fn fresh_id(&mut self) -> SymbolId {
        let id = SymbolId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Depth of the innermost scope; the outermost scope is depth 0
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
        log::trace!("enter scope at depth {}", self.depth());
    }

    /// Leave the innermost scope, returning the depth of its parent.
    /// The outermost scope is never popped.
    pub fn pop_scope(&mut self) -> usize {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            log::trace!("leave scope, back at depth {}", self.depth());
        }
        self.depth()
    }

    /// Declare `name` in the innermost scope
    pub fn declare(&mut self, name: &str) -> Result<SymbolRef> {
        let taken = self
            .scopes
            .last()
            .is_some_and(|scope| scope.symbols.contains_key(name));
        if taken {
            return Err(Error::Redeclaration {
                name: name.to_string(),
            });
        }

        let symbol = Rc::new(Symbol::new(self.fresh_id(), name));
        let depth = self.depth();
        if let Some(scope) = self.scopes.last_mut() {
            scope.symbols.insert(name.to_string(), Rc::clone(&symbol));
        }
        log::debug!("declared {} at depth {}", name, depth);
        Ok(symbol)
    }

    /// Look `name` up, innermost scope first
    pub fn resolve(&self, name: &str) -> Result<SymbolRef> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
            .cloned()
            .ok_or_else(|| Error::SymbolNotFound {
                name: name.to_string(),
            })
    }

    /// A placeholder for a name that failed to declare or resolve.
    /// It is not entered into any scope.
    pub fn error_symbol(&mut self, name: &str, message: impl Into<String>) -> SymbolRef {
        let symbol = Symbol::new(self.fresh_id(), name);
        symbol.set_type(Type::error(message));
        Rc::new(symbol)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The visible symbols, outermost scope first, indented two spaces per depth
impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, scope) in self.scopes.iter().enumerate() {
            for symbol in scope.symbols.values() {
                writeln!(f, "{}{}", "  ".repeat(depth), symbol)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_seeded_in_order() {
        let table = SymbolTable::with_builtins();
        assert_eq!(
            table.to_string(),
            "Symbol(readInt:func(TypeList()):int)\n\
             Symbol(readFloat:func(TypeList()):float)\n\
             Symbol(printBool:func(TypeList(bool)):void)\n\
             Symbol(printInt:func(TypeList(int)):void)\n\
             Symbol(printFloat:func(TypeList(float)):void)\n\
             Symbol(println:func(TypeList()):void)\n"
        );
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let mut table = SymbolTable::new();
        let outer = table.declare("x").unwrap();
        outer.set_type(Type::Int);

        table.push_scope();
        let inner = table.declare("x").unwrap();
        inner.set_type(Type::Float);

        let found = table.resolve("x").unwrap();
        assert_eq!(found.id(), inner.id());
        assert_eq!(found.ty(), Type::Float);

        assert_eq!(table.pop_scope(), 0);
        assert_eq!(table.resolve("x").unwrap().id(), outer.id());
    }

    #[test]
    fn test_redeclaration_keeps_original() {
        let mut table = SymbolTable::new();
        let first = table.declare("x").unwrap();
        first.set_type(Type::Bool);

        let err = table.declare("x").unwrap_err();
        assert_eq!(err, Error::Redeclaration { name: "x".to_string() });
        assert_eq!(err.to_string(), "Symbol x being redeclared.");
        assert_eq!(table.resolve("x").unwrap().ty(), Type::Bool);
        assert!(!first.set_type(Type::Int));
        assert_eq!(first.ty(), Type::Bool);
    }

    #[test]
    fn test_missing_symbol() {
        let mut table = SymbolTable::new();
        table.push_scope();
        let err = table.resolve("nope").unwrap_err();
        assert_eq!(err.to_string(), "Could not find nope.");
    }

    #[test]
    fn test_outermost_scope_is_never_popped() {
        let mut table = SymbolTable::new();
        assert_eq!(table.pop_scope(), 0);
        table.declare("g").unwrap();
        assert!(table.resolve("g").is_ok());
    }

    #[test]
    fn test_dump_indents_by_depth() {
        let mut table = SymbolTable::new();
        table.declare("g").unwrap().set_type(Type::Int);
        table.push_scope();
        table.declare("l").unwrap().set_type(Type::array(2, Type::Float));
        assert_eq!(table.to_string(), "Symbol(g:int)\n  Symbol(l:array[2,float])\n");
    }

    #[test]
    fn test_error_symbol_is_not_declared() {
        let mut table = SymbolTable::new();
        let placeholder = table.error_symbol("y", "Could not find y.");
        assert!(placeholder.ty().is_error());
        assert!(table.resolve("y").is_err());
    }
}
