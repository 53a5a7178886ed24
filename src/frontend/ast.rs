//! Abstract Syntax Tree definitions for Crux
//!
//! The tree is a closed set of node variants. Every node carries a
//! [`NodeId`], unique within one parse, which later passes use as the key
//! of their side tables, and the source position it started at.

use std::fmt;

use crate::frontend::symbol::SymbolRef;
use crate::utils::Position;

/// Identity of a node within one parsed tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// An AST node
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    pub kind: NodeKind,
}

/// Arithmetic and logical binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Node variants
#[derive(Debug, Clone)]
pub enum NodeKind {
    // ============ Expressions ============
    LiteralInt(i32),
    LiteralFloat(f32),
    LiteralBool(bool),
    /// The storage address of a symbol
    AddressOf(SymbolRef),
    /// Load the value stored at an address
    Dereference(Box<Node>),
    /// Address of element `amount` of the array at `base`
    Index { base: Box<Node>, amount: Box<Node> },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Comparison {
        op: CompareOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalNot(Box<Node>),
    /// A call; `arguments` is always an `ExpressionList`
    Call {
        function: SymbolRef,
        arguments: Box<Node>,
    },

    // ============ Statements ============
    Assignment {
        destination: Box<Node>,
        source: Box<Node>,
    },
    VariableDeclaration(SymbolRef),
    ArrayDeclaration(SymbolRef),
    FunctionDefinition {
        function: SymbolRef,
        parameters: Vec<SymbolRef>,
        body: Box<Node>,
    },
    /// A missing `else` is an empty `StatementList`
    IfElseBranch {
        condition: Box<Node>,
        then_block: Box<Node>,
        else_block: Box<Node>,
    },
    WhileLoop {
        condition: Box<Node>,
        body: Box<Node>,
    },
    Return(Option<Box<Node>>),

    // ============ Containers ============
    ExpressionList(Vec<Node>),
    DeclarationList(Vec<Node>),
    StatementList(Vec<Node>),

    /// A construct the parser could not complete
    Error(String),
}

impl Node {
    pub fn new(id: NodeId, position: Position, kind: NodeKind) -> Self {
        Self { id, position, kind }
    }

    /// Name of the node variant
    pub fn name(&self) -> &'static str {
        match &self.kind {
            NodeKind::LiteralInt(_) => "LiteralInt",
            NodeKind::LiteralFloat(_) => "LiteralFloat",
            NodeKind::LiteralBool(_) => "LiteralBool",
            NodeKind::AddressOf(_) => "AddressOf",
            NodeKind::Dereference(_) => "Dereference",
            NodeKind::Index { .. } => "Index",
            NodeKind::Binary { op, .. } => op.node_name(),
            NodeKind::Comparison { .. } => "Comparison",
            NodeKind::LogicalNot(_) => "LogicalNot",
            NodeKind::Call { .. } => "Call",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::VariableDeclaration(_) => "VariableDeclaration",
            NodeKind::ArrayDeclaration(_) => "ArrayDeclaration",
            NodeKind::FunctionDefinition { .. } => "FunctionDefinition",
            NodeKind::IfElseBranch { .. } => "IfElseBranch",
            NodeKind::WhileLoop { .. } => "WhileLoop",
            NodeKind::Return(_) => "Return",
            NodeKind::ExpressionList(_) => "ExpressionList",
            NodeKind::DeclarationList(_) => "DeclarationList",
            NodeKind::StatementList(_) => "StatementList",
            NodeKind::Error(_) => "Error",
        }
    }

    /// Children in evaluation order
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::LiteralInt(_)
            | NodeKind::LiteralFloat(_)
            | NodeKind::LiteralBool(_)
            | NodeKind::AddressOf(_)
            | NodeKind::VariableDeclaration(_)
            | NodeKind::ArrayDeclaration(_)
            | NodeKind::Error(_) => Vec::new(),
            NodeKind::Dereference(inner) | NodeKind::LogicalNot(inner) => vec![&**inner],
            NodeKind::Index { base, amount } => vec![&**base, &**amount],
            NodeKind::Binary { left, right, .. } | NodeKind::Comparison { left, right, .. } => {
                vec![&**left, &**right]
            }
            NodeKind::Call { arguments, .. } => vec![&**arguments],
            NodeKind::Assignment { destination, source } => vec![&**destination, &**source],
            NodeKind::FunctionDefinition { body, .. } => vec![&**body],
            NodeKind::IfElseBranch {
                condition,
                then_block,
                else_block,
            } => vec![&**condition, &**then_block, &**else_block],
            NodeKind::WhileLoop { condition, body } => vec![&**condition, &**body],
            NodeKind::Return(value) => value.iter().map(|v| &**v).collect(),
            NodeKind::ExpressionList(items)
            | NodeKind::DeclarationList(items)
            | NodeKind::StatementList(items) => items.iter().collect(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NodeKind::Error(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name(), self.position)
    }
}

impl BinaryOp {
    fn node_name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "Addition",
            BinaryOp::Sub => "Subtraction",
            BinaryOp::Mul => "Multiplication",
            BinaryOp::Div => "Division",
            BinaryOp::And => "LogicalAnd",
            BinaryOp::Or => "LogicalOr",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// Hands out fresh node ids in creation order
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: usize,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}
