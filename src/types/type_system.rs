//! Type System for Crux
//!
//! A closed algebra of type values. Every operation is total: it yields
//! either the resulting type or an [`Type::Error`] describing why the
//! operands do not combine. An operation that receives an error passes it
//! through unchanged, so one root cause produces one diagnostic.

use std::fmt;

/// Size in bytes of every scalar value and of one operand-stack slot
pub const WORD_SIZE: usize = 4;

/// A Crux type
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    Bool,
    Void,
    Array { extent: usize, base: Box<Type> },
    Address(Box<Type>),
    Func { params: Vec<Type>, ret: Box<Type> },
    Error(String),
}

impl Type {
    pub fn error(message: impl Into<String>) -> Self {
        Type::Error(message.into())
    }

    pub fn array(extent: usize, base: Type) -> Self {
        Type::Array { extent, base: Box::new(base) }
    }

    pub fn address(base: Type) -> Self {
        Type::Address(Box::new(base))
    }

    pub fn func(params: Vec<Type>, ret: Type) -> Self {
        Type::Func { params, ret: Box::new(ret) }
    }

    /// Resolve a type name as written in a declaration
    pub fn from_name(name: &str) -> Self {
        match name {
            "int" => Type::Int,
            "float" => Type::Float,
            "bool" => Type::Bool,
            "void" => Type::Void,
            _ => Type::error(format!("Unknown type: {}.", name)),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error(_))
    }

    /// Int, Float or Bool
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Bool)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// The innermost element type of a (possibly nested) array
    pub fn innermost(&self) -> &Type {
        match self {
            Type::Array { base, .. } => base.innermost(),
            other => other,
        }
    }

    /// Storage size in bytes, if the type occupies storage
    pub fn size_of(&self) -> Option<usize> {
        match self {
            Type::Int | Type::Float | Type::Bool => Some(WORD_SIZE),
            Type::Array { extent, base } => base.size_of().map(|size| extent * size),
            Type::Void | Type::Address(_) | Type::Func { .. } | Type::Error(_) => None,
        }
    }

    /// Structural equivalence
    pub fn equivalent(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Int, Type::Int)
            | (Type::Float, Type::Float)
            | (Type::Bool, Type::Bool)
            | (Type::Void, Type::Void) => true,
            (Type::Array { extent: ea, base: ba }, Type::Array { extent: eb, base: bb }) => {
                ea == eb && ba.equivalent(bb)
            }
            (Type::Address(a), Type::Address(b)) => a.equivalent(b),
            (Type::Func { params: pa, ret: ra }, Type::Func { params: pb, ret: rb }) => {
                list_equivalent(pa, pb) && ra.equivalent(rb)
            }
            _ => false,
        }
    }

    /// The first error among `types`, if any
    fn first_error<'a>(types: impl IntoIterator<Item = &'a Type>) -> Option<Type> {
        types.into_iter().find(|t| t.is_error()).cloned()
    }

    fn arithmetic(&self, that: &Type, describe: impl FnOnce() -> String) -> Type {
        if let Some(err) = Self::first_error([self, that]) {
            return err;
        }
        match (self, that) {
            (Type::Int, Type::Int) => Type::Int,
            (Type::Float, Type::Float) => Type::Float,
            _ => Type::error(describe()),
        }
    }

    pub fn add(&self, that: &Type) -> Type {
        self.arithmetic(that, || format!("Cannot add {} with {}.", self, that))
    }

    pub fn sub(&self, that: &Type) -> Type {
        self.arithmetic(that, || format!("Cannot subtract {} from {}.", that, self))
    }

    pub fn mul(&self, that: &Type) -> Type {
        self.arithmetic(that, || format!("Cannot multiply {} with {}.", self, that))
    }

    pub fn div(&self, that: &Type) -> Type {
        self.arithmetic(that, || format!("Cannot divide {} by {}.", self, that))
    }

    pub fn and(&self, that: &Type) -> Type {
        if let Some(err) = Self::first_error([self, that]) {
            return err;
        }
        match (self, that) {
            (Type::Bool, Type::Bool) => Type::Bool,
            _ => Type::error(format!("Cannot compute {} and {}.", self, that)),
        }
    }

    pub fn or(&self, that: &Type) -> Type {
        if let Some(err) = Self::first_error([self, that]) {
            return err;
        }
        match (self, that) {
            (Type::Bool, Type::Bool) => Type::Bool,
            _ => Type::error(format!("Cannot compute {} or {}.", self, that)),
        }
    }

    pub fn not(&self) -> Type {
        match self {
            Type::Error(_) => self.clone(),
            Type::Bool => Type::Bool,
            _ => Type::error(format!("Cannot negate {}.", self)),
        }
    }

    pub fn compare(&self, that: &Type) -> Type {
        if let Some(err) = Self::first_error([self, that]) {
            return err;
        }
        match (self, that) {
            (Type::Int, Type::Int) | (Type::Float, Type::Float) => Type::Bool,
            _ => Type::error(format!("Cannot compare {} with {}.", self, that)),
        }
    }

    pub fn deref(&self) -> Type {
        match self {
            Type::Error(_) => self.clone(),
            Type::Address(base) => (**base).clone(),
            _ => Type::error(format!("Cannot dereference {}.", self)),
        }
    }

    /// Index `self`, the address of an array, by `amount`
    pub fn index(&self, amount: &Type) -> Type {
        if let Some(err) = Self::first_error([self, amount]) {
            return err;
        }
        match (self, amount) {
            (Type::Address(inner), Type::Int) => match inner.as_ref() {
                Type::Array { base, .. } => Type::Address(base.clone()),
                _ => Type::error(format!("Cannot index {} with {}.", self, amount)),
            },
            _ => Type::error(format!("Cannot index {} with {}.", self, amount)),
        }
    }

    /// Store `source` through `self`, which must be the address of a scalar
    pub fn assign(&self, source: &Type) -> Type {
        if let Some(err) = Self::first_error([self, source]) {
            return err;
        }
        match self {
            Type::Address(base) if base.is_scalar() && base.equivalent(source) => source.clone(),
            _ => Type::error(format!("Cannot assign {} to {}.", source, self)),
        }
    }

    /// An error inside a function signature, in a parameter or the return type
    pub fn signature_error(&self) -> Option<&Type> {
        match self {
            Type::Func { params, ret } => params
                .iter()
                .chain(std::iter::once(&**ret))
                .find(|ty| ty.is_error()),
            _ => None,
        }
    }

    /// Call `self`, a function type, with the given argument types
    pub fn call(&self, args: &[Type]) -> Type {
        let inputs = std::iter::once(self)
            .chain(self.signature_error())
            .chain(args);
        if let Some(err) = Self::first_error(inputs) {
            return err;
        }
        match self {
            Type::Func { params, ret } if list_equivalent(params, args) => (**ret).clone(),
            _ => Type::error(format!("Cannot call {} using {}.", self, TypeList(args))),
        }
    }
}

fn list_equivalent(a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equivalent(y))
}

/// Display adapter for an ordered list of types
pub struct TypeList<'a>(pub &'a [Type]);

impl fmt::Display for TypeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeList(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ty)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Bool => f.write_str("bool"),
            Type::Void => f.write_str("void"),
            Type::Array { extent, base } => write!(f, "array[{},{}]", extent, base),
            Type::Address(base) => write!(f, "Address({})", base),
            Type::Func { params, ret } => write!(f, "func({}):{}", TypeList(params), ret),
            Type::Error(message) => write!(f, "ErrorType({})", message),
        }
    }
}
