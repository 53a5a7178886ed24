//! AST pretty printer
//!
//! Renders one node per line, indented two spaces per level of nesting.

use std::fmt::Write;

use crate::frontend::ast::{Node, NodeKind};

/// Render `root` and everything below it
pub fn pretty_print(root: &Node) -> String {
    let mut out = String::new();
    print_node(&mut out, root, 0);
    out
}

fn print_node(out: &mut String, node: &Node, depth: usize) {
    let _ = write!(out, "{}{}", "  ".repeat(depth), node);
    if let Some(detail) = detail(node) {
        let _ = write!(out, "({})", detail);
    }
    out.push('\n');

    for child in node.children() {
        print_node(out, child, depth + 1);
    }
}

/// The part of a node that is not a child node
fn detail(node: &Node) -> Option<String> {
    match &node.kind {
        NodeKind::LiteralInt(value) => Some(value.to_string()),
        NodeKind::LiteralFloat(value) => Some(value.to_string()),
        NodeKind::LiteralBool(value) => Some(value.to_string()),
        NodeKind::AddressOf(symbol)
        | NodeKind::VariableDeclaration(symbol)
        | NodeKind::ArrayDeclaration(symbol)
        | NodeKind::Call {
            function: symbol, ..
        } => Some(symbol.to_string()),
        NodeKind::FunctionDefinition {
            function,
            parameters,
            ..
        } => {
            let params: Vec<_> = parameters.iter().map(|p| p.to_string()).collect();
            Some(format!("{}, [{}]", function, params.join(", ")))
        }
        NodeKind::Comparison { op, .. } => Some(op.to_string()),
        NodeKind::Error(message) => Some(message.clone()),
        NodeKind::Dereference(_)
        | NodeKind::Index { .. }
        | NodeKind::Binary { .. }
        | NodeKind::LogicalNot(_)
        | NodeKind::Assignment { .. }
        | NodeKind::IfElseBranch { .. }
        | NodeKind::WhileLoop { .. }
        | NodeKind::Return(_)
        | NodeKind::ExpressionList(_)
        | NodeKind::DeclarationList(_)
        | NodeKind::StatementList(_) => None,
    }
}
