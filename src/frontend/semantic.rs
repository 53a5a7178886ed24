//! Type checking for Crux
//!
//! One depth-first pass over the AST that computes a [`Type`] for every
//! node and stores it in a side table keyed by [`NodeId`]. The tree itself
//! is never modified.
//!
//! A diagnostic is recorded only where an error type is *created*. A node
//! whose error was handed up from one of its inputs carries it silently,
//! so each root cause is reported once.

use std::collections::HashMap;

use crate::frontend::ast::*;
use crate::frontend::symbol::SymbolRef;
use crate::types::Type;

/// Computed type of every non-list node
pub type TypeMap = HashMap<NodeId, Type>;

/// The function whose body is being checked
#[derive(Debug, Clone)]
struct FunctionContext {
    name: String,
    ret: Type,
}

impl FunctionContext {
    fn is_main(&self) -> bool {
        self.name == "main"
    }
}

/// The type checker
pub struct TypeChecker {
    types: TypeMap,
    /// Per-child types of `ExpressionList`, `DeclarationList` and `StatementList` nodes
    list_types: HashMap<NodeId, Vec<Type>>,
    errors: Vec<String>,
    function: Option<FunctionContext>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            types: TypeMap::new(),
            list_types: HashMap::new(),
            errors: Vec::new(),
            function: None,
        }
    }

    /// Check a whole tree; true when no type errors were found
    pub fn check(&mut self, root: &Node) -> bool {
        self.visit(root);
        !self.has_error()
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All diagnostics, each followed by a newline
    pub fn error_report(&self) -> String {
        self.errors.iter().map(|e| format!("{}\n", e)).collect()
    }

    pub fn types(&self) -> &TypeMap {
        &self.types
    }

    pub fn type_of(&self, node: &Node) -> Option<&Type> {
        self.types.get(&node.id)
    }

    pub fn list_types_of(&self, node: &Node) -> Option<&[Type]> {
        self.list_types.get(&node.id).map(Vec::as_slice)
    }

    // ==================== Recording ====================

    fn report(&mut self, node: &Node, message: &str) {
        self.errors
            .push(format!("TypeError({})[{}]", node.position, message));
    }

    /// Store the type computed for `node` from `inputs`; a fresh error is reported
    fn put(&mut self, node: &Node, ty: Type, inputs: &[&Type]) -> Type {
        if let Type::Error(message) = &ty {
            if !inputs.iter().any(|input| input.is_error()) {
                self.report(node, message);
            }
        }
        self.types.insert(node.id, ty.clone());
        ty
    }

    // ==================== Dispatch ====================

    fn visit(&mut self, node: &Node) -> Type {
        match &node.kind {
            NodeKind::LiteralInt(_) => self.put(node, Type::Int, &[]),
            NodeKind::LiteralFloat(_) => self.put(node, Type::Float, &[]),
            NodeKind::LiteralBool(_) => self.put(node, Type::Bool, &[]),
            NodeKind::AddressOf(symbol) => {
                let declared = symbol.ty();
                let ty = if declared.is_error() {
                    declared.clone()
                } else {
                    Type::address(declared.clone())
                };
                self.put(node, ty, &[&declared])
            }
            NodeKind::Dereference(inner) => {
                let inner = self.visit(inner);
                self.put(node, inner.deref(), &[&inner])
            }
            NodeKind::Index { base, amount } => {
                let base = self.visit(base);
                let amount = self.visit(amount);
                self.put(node, base.index(&amount), &[&base, &amount])
            }
            NodeKind::Binary { op, left, right } => {
                let left = self.visit(left);
                let right = self.visit(right);
                let ty = match op {
                    BinaryOp::Add => left.add(&right),
                    BinaryOp::Sub => left.sub(&right),
                    BinaryOp::Mul => left.mul(&right),
                    BinaryOp::Div => left.div(&right),
                    BinaryOp::And => left.and(&right),
                    BinaryOp::Or => left.or(&right),
                };
                self.put(node, ty, &[&left, &right])
            }
            NodeKind::Comparison { left, right, .. } => {
                let left = self.visit(left);
                let right = self.visit(right);
                self.put(node, left.compare(&right), &[&left, &right])
            }
            NodeKind::LogicalNot(inner) => {
                let inner = self.visit(inner);
                self.put(node, inner.not(), &[&inner])
            }
            NodeKind::Call { function, arguments } => self.visit_call(node, function, arguments),
            NodeKind::Assignment {
                destination,
                source,
            } => {
                let destination = self.visit(destination);
                let source = self.visit(source);
                self.put(node, destination.assign(&source), &[&destination, &source])
            }
            NodeKind::VariableDeclaration(symbol) => self.visit_variable(node, symbol),
            NodeKind::ArrayDeclaration(symbol) => self.visit_array(node, symbol),
            NodeKind::FunctionDefinition {
                function,
                parameters,
                body,
            } => self.visit_function(node, function, parameters, body),
            NodeKind::IfElseBranch {
                condition,
                then_block,
                else_block,
            } => {
                let ty = self.visit_condition(node, condition);
                self.visit(then_block);
                self.visit(else_block);
                ty
            }
            NodeKind::WhileLoop { condition, body } => {
                let ty = self.visit_condition(node, condition);
                self.visit(body);
                ty
            }
            NodeKind::Return(value) => self.visit_return(node, value.as_deref()),
            NodeKind::ExpressionList(items)
            | NodeKind::DeclarationList(items)
            | NodeKind::StatementList(items) => {
                let types = items.iter().map(|item| self.visit(item)).collect();
                self.list_types.insert(node.id, types);
                Type::Void
            }
            NodeKind::Error(message) => self.put(node, Type::error(message.clone()), &[]),
        }
    }

    fn visit_call(&mut self, node: &Node, function: &SymbolRef, arguments: &Node) -> Type {
        self.visit(arguments);
        let args = self.list_types_of(arguments).unwrap_or_default().to_vec();
        let callee = function.ty();

        let mut inputs: Vec<&Type> = args.iter().collect();
        inputs.push(&callee);
        inputs.extend(callee.signature_error());
        let ty = callee.call(&args);
        self.put(node, ty, &inputs)
    }

    fn visit_variable(&mut self, node: &Node, symbol: &SymbolRef) -> Type {
        let declared = symbol.ty();
        if declared.is_error() || declared.is_scalar() {
            return self.put(node, declared, &[]);
        }
        let ty = Type::error(format!(
            "Variable {} has invalid type {}.",
            symbol.name(),
            declared
        ));
        self.put(node, ty, &[])
    }

    fn visit_array(&mut self, node: &Node, symbol: &SymbolRef) -> Type {
        let declared = symbol.ty();
        let base = declared.innermost();
        let ty = if declared.is_error() || base.is_error() {
            base.clone()
        } else if !matches!(declared, Type::Array { .. }) {
            Type::error(format!(
                "Variable {} has invalid type {}.",
                symbol.name(),
                declared
            ))
        } else if !base.is_scalar() {
            Type::error(format!(
                "Array {} has invalid base type {}.",
                symbol.name(),
                base
            ))
        } else {
            declared.clone()
        };
        self.put(node, ty, &[])
    }

    fn visit_function(
        &mut self,
        node: &Node,
        function: &SymbolRef,
        parameters: &[SymbolRef],
        body: &Node,
    ) -> Type {
        let name = function.name().to_string();
        let signature = function.ty();
        log::debug!("checking function {}: {}", name, signature);

        let ret = match &signature {
            Type::Func { ret, .. } => (**ret).clone(),
            other => other.clone(),
        };

        if name == "main" {
            if !ret.is_void() || !parameters.is_empty() {
                self.report(node, "Function main has invalid signature.");
            }
        } else {
            for (position, parameter) in parameters.iter().enumerate() {
                match parameter.ty() {
                    Type::Void => self.report(
                        node,
                        &format!("Function {} has a void argument in position {}.", name, position),
                    ),
                    Type::Error(message) => self.report(
                        node,
                        &format!(
                            "Function {} has an error in argument in position {}: {}",
                            name, position, message
                        ),
                    ),
                    _ => {}
                }
            }
            if let Type::Error(message) = &ret {
                self.report(node, message);
            }
        }

        let context = FunctionContext {
            name: name.clone(),
            ret: ret.clone(),
        };
        let outer = self.function.replace(context.clone());
        self.visit(body);
        self.function = outer;

        if !context.is_main() && !ret.is_void() && !ret.is_error() && !self.returns_on_every_path(body, &ret) {
            self.report(
                node,
                &format!("Not all paths in function {} have a return.", name),
            );
        }

        self.types.insert(node.id, signature.clone());
        signature
    }

    /// A body is covered when one of its top-level statements has the
    /// declared type, or already failed to type
    fn returns_on_every_path(&self, body: &Node, ret: &Type) -> bool {
        self.list_types_of(body)
            .unwrap_or_default()
            .iter()
            .any(|ty| ty.is_error() || ty.equivalent(ret))
    }

    /// Type a branch or loop condition; the construct takes the condition's error, if any
    fn visit_condition(&mut self, node: &Node, condition: &Node) -> Type {
        let condition = self.visit(condition);
        let ty = match &condition {
            Type::Error(_) => condition.clone(),
            Type::Bool => Type::Void,
            other => Type::error(format!(
                "{} requires bool condition not {}.",
                node.name(),
                other
            )),
        };
        self.put(node, ty, &[&condition])
    }

    fn visit_return(&mut self, node: &Node, value: Option<&Node>) -> Type {
        let returned = match value {
            Some(value) => self.visit(value),
            None => Type::Void,
        };

        let ty = match &self.function {
            Some(context) if !context.is_main() && !returned.is_error() && !context.ret.is_error() => {
                if returned.equivalent(&context.ret) {
                    returned.clone()
                } else {
                    Type::error(format!(
                        "Function {} returns {} not {}.",
                        context.name, context.ret, returned
                    ))
                }
            }
            _ => returned.clone(),
        };
        self.put(node, ty, &[&returned])
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}
