//! Parser for Crux
//!
//! LL(1) recursive descent. Each grammar rule is one method; the choice
//! between alternatives is made by testing the current token against the
//! FIRST set of each alternative. Names are declared and resolved while
//! parsing, so the finished tree already links every use to its symbol.
//!
//! A failed `expect` records a syntax error and unwinds the whole parse
//! through `Result`. Resolution failures are recorded too, but parsing
//! carries on with a placeholder symbol.

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::symbol::{SymbolRef, SymbolTable};
use crate::frontend::token::{Token, TokenKind};
use crate::types::Type;
use crate::utils::{Error, Position, Result};

/// Grammar nonterminals that the parser predicts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonTerminal {
    Op0,
    Op1,
    Op2,
    Literal,
    Designator,
    Type,
    CallExpression,
    Expression3,
    Expression2,
    Expression1,
    Expression0,
    ExpressionList,
    Parameter,
    ParameterList,
    VariableDeclaration,
    ArrayDeclaration,
    FunctionDefinition,
    Declaration,
    DeclarationList,
    Program,
    Statement,
    StatementList,
    StatementBlock,
    CallStatement,
    AssignmentStatement,
    IfStatement,
    WhileStatement,
    ReturnStatement,
}

const EXPRESSION_FIRST: &[TokenKind] = &[
    TokenKind::Not,
    TokenKind::OpenParen,
    TokenKind::Identifier,
    TokenKind::Call,
    TokenKind::Integer,
    TokenKind::Float,
    TokenKind::True,
    TokenKind::False,
];

const DECLARATION_FIRST: &[TokenKind] = &[TokenKind::Var, TokenKind::Array, TokenKind::Func];

const STATEMENT_FIRST: &[TokenKind] = &[
    TokenKind::Var,
    TokenKind::Array,
    TokenKind::Call,
    TokenKind::Let,
    TokenKind::If,
    TokenKind::While,
    TokenKind::Return,
];

impl NonTerminal {
    /// Token kinds that can begin this nonterminal
    pub fn first_set(&self) -> &'static [TokenKind] {
        match self {
            NonTerminal::Op0 => &[
                TokenKind::GreaterEqual,
                TokenKind::LesserEqual,
                TokenKind::NotEqual,
                TokenKind::Equal,
                TokenKind::GreaterThan,
                TokenKind::LessThan,
            ],
            NonTerminal::Op1 => &[TokenKind::Add, TokenKind::Sub, TokenKind::Or],
            NonTerminal::Op2 => &[TokenKind::Mul, TokenKind::Div, TokenKind::And],
            NonTerminal::Literal => &[
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::True,
                TokenKind::False,
            ],
            NonTerminal::Designator
            | NonTerminal::Type
            | NonTerminal::Parameter
            | NonTerminal::ParameterList => &[TokenKind::Identifier],
            NonTerminal::CallExpression | NonTerminal::CallStatement => &[TokenKind::Call],
            NonTerminal::Expression3
            | NonTerminal::Expression2
            | NonTerminal::Expression1
            | NonTerminal::Expression0
            | NonTerminal::ExpressionList => EXPRESSION_FIRST,
            NonTerminal::VariableDeclaration => &[TokenKind::Var],
            NonTerminal::ArrayDeclaration => &[TokenKind::Array],
            NonTerminal::FunctionDefinition => &[TokenKind::Func],
            NonTerminal::Declaration | NonTerminal::DeclarationList => DECLARATION_FIRST,
            NonTerminal::Program => &[
                TokenKind::Var,
                TokenKind::Array,
                TokenKind::Func,
                TokenKind::Eof,
            ],
            NonTerminal::Statement | NonTerminal::StatementList => STATEMENT_FIRST,
            NonTerminal::StatementBlock => &[TokenKind::OpenBrace],
            NonTerminal::AssignmentStatement => &[TokenKind::Let],
            NonTerminal::IfStatement => &[TokenKind::If],
            NonTerminal::WhileStatement => &[TokenKind::While],
            NonTerminal::ReturnStatement => &[TokenKind::Return],
        }
    }

    /// Diagnostic name, as it appears in syntax errors
    pub fn name(&self) -> &'static str {
        match self {
            NonTerminal::Op0 => "OP0",
            NonTerminal::Op1 => "OP1",
            NonTerminal::Op2 => "OP2",
            NonTerminal::Literal => "LITERAL",
            NonTerminal::Designator => "DESIGNATOR",
            NonTerminal::Type => "TYPE",
            NonTerminal::CallExpression => "CALL_EXPRESSION",
            NonTerminal::Expression3 => "EXPRESSION3",
            NonTerminal::Expression2 => "EXPRESSION2",
            NonTerminal::Expression1 => "EXPRESSION1",
            NonTerminal::Expression0 => "EXPRESSION0",
            NonTerminal::ExpressionList => "EXPRESSION_LIST",
            NonTerminal::Parameter => "PARAMETER",
            NonTerminal::ParameterList => "PARAMETER_LIST",
            NonTerminal::VariableDeclaration => "VARIABLE_DECLARATION",
            NonTerminal::ArrayDeclaration => "ARRAY_DECLARATION",
            NonTerminal::FunctionDefinition => "FUNCTION_DEFINITION",
            NonTerminal::Declaration => "DECLARATION",
            NonTerminal::DeclarationList => "DECLARATION_LIST",
            NonTerminal::Program => "PROGRAM",
            NonTerminal::Statement => "STATEMENT",
            NonTerminal::StatementList => "STATEMENT_LIST",
            NonTerminal::StatementBlock => "STATEMENT_BLOCK",
            NonTerminal::CallStatement => "CALL_STATEMENT",
            NonTerminal::AssignmentStatement => "ASSIGNMENT_STATEMENT",
            NonTerminal::IfStatement => "IF_STATEMENT",
            NonTerminal::WhileStatement => "WHILE_STATEMENT",
            NonTerminal::ReturnStatement => "RETURN_STATEMENT",
        }
    }
}

/// Something the current token can be tested against
pub trait Expected: Copy {
    fn matches(&self, kind: TokenKind) -> bool;

    /// How the expectation reads in a syntax error
    fn describe(&self) -> String;
}

impl Expected for TokenKind {
    fn matches(&self, kind: TokenKind) -> bool {
        *self == kind
    }

    fn describe(&self) -> String {
        self.name().to_string()
    }
}

impl Expected for NonTerminal {
    fn matches(&self, kind: TokenKind) -> bool {
        self.first_set().contains(&kind)
    }

    fn describe(&self) -> String {
        format!("a token from {}", self.name())
    }
}

/// The parser
pub struct Parser {
    lexer: Lexer,
    current: Token,
    symbols: SymbolTable,
    ids: NodeIdGen,
    /// Rendered diagnostics, in the order they were found
    errors: Vec<String>,
}

impl Parser {
    /// Create a new parser pulling tokens from `lexer` on demand
    pub fn new(mut lexer: Lexer) -> Self {
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            symbols: SymbolTable::with_builtins(),
            ids: NodeIdGen::new(),
            errors: Vec::new(),
        }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::new(source))
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All diagnostics, each followed by a newline
    pub fn error_report(&self) -> String {
        self.errors.iter().map(|e| format!("{}\n", e)).collect()
    }

    /// Parse a whole program
    ///
    /// Returns the `DeclarationList` root, or a single `Error` node when a
    /// syntax error cut the parse short.
    pub fn parse(&mut self) -> Node {
        match self.program() {
            Ok(root) => root,
            Err(err) => {
                log::debug!("parse aborted: {}", err);
                let position = match err {
                    Error::QuitParse { position, .. } => position,
                    _ => self.current.position,
                };
                self.node(position, NodeKind::Error("Could not complete parsing.".to_string()))
            }
        }
    }

    // ==================== Helper Methods ====================

    fn node(&mut self, position: Position, kind: NodeKind) -> Node {
        Node::new(self.ids.next_id(), position, kind)
    }

    fn position(&self) -> Position {
        self.current.position
    }

    fn have(&self, expected: impl Expected) -> bool {
        expected.matches(self.current.kind)
    }

    fn accept(&mut self, expected: impl Expected) -> bool {
        if self.have(expected) {
            self.current = self.lexer.next_token();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: impl Expected) -> Result<()> {
        self.expect_retrieve(expected).map(|_| ())
    }

    fn expect_retrieve(&mut self, expected: impl Expected) -> Result<Token> {
        let token = self.current.clone();
        if self.accept(expected) {
            Ok(token)
        } else {
            Err(self.syntax_error(expected))
        }
    }

    fn syntax_error(&mut self, expected: impl Expected) -> Error {
        let position = self.position();
        let message = format!(
            "SyntaxError({})[Expected {} but got {}.]",
            position,
            expected.describe(),
            self.current.kind
        );
        self.errors.push(message.clone());
        Error::QuitParse { message, position }
    }

    // ==================== Symbol Management ====================

    fn try_declare(&mut self, ident: &Token) -> SymbolRef {
        match self.symbols.declare(&ident.lexeme) {
            Ok(symbol) => symbol,
            Err(_) => {
                let message = format!(
                    "DeclareSymbolError({})[{} already exists.]",
                    ident.position, ident.lexeme
                );
                self.report_with_scopes(&message);
                self.symbols.error_symbol(&ident.lexeme, message)
            }
        }
    }

    fn try_resolve(&mut self, ident: &Token) -> SymbolRef {
        match self.symbols.resolve(&ident.lexeme) {
            Ok(symbol) => symbol,
            Err(err) => {
                let message = format!("ResolveSymbolError({})[{}]", ident.position, err);
                self.report_with_scopes(&message);
                self.symbols.error_symbol(&ident.lexeme, message)
            }
        }
    }

    fn report_with_scopes(&mut self, message: &str) {
        self.errors.push(format!("{}\n{}", message, self.symbols));
    }

    // ==================== Grammar Rules ====================

    // literal := INTEGER | FLOAT | "true" | "false" .
    fn literal(&mut self) -> Result<Node> {
        let token = self.expect_retrieve(NonTerminal::Literal)?;
        let kind = match token.kind {
            TokenKind::Integer => match token.lexeme.parse::<i32>() {
                Ok(value) => NodeKind::LiteralInt(value),
                Err(_) => NodeKind::Error(format!("Integer {} is out of range.", token.lexeme)),
            },
            TokenKind::Float => match token.lexeme.parse::<f32>() {
                Ok(value) => NodeKind::LiteralFloat(value),
                Err(_) => NodeKind::Error(format!("Malformed float {}.", token.lexeme)),
            },
            TokenKind::True => NodeKind::LiteralBool(true),
            _ => NodeKind::LiteralBool(false),
        };
        Ok(self.node(token.position, kind))
    }

    // designator := IDENTIFIER { "[" expression0 "]" } .
    fn designator(&mut self) -> Result<Node> {
        let ident = self.expect_retrieve(TokenKind::Identifier)?;
        let symbol = self.try_resolve(&ident);
        let mut base = self.node(ident.position, NodeKind::AddressOf(symbol));

        while self.accept(TokenKind::OpenBracket) {
            let position = self.position();
            let amount = self.expression0()?;
            self.expect(TokenKind::CloseBracket)?;
            base = self.node(
                position,
                NodeKind::Index {
                    base: Box::new(base),
                    amount: Box::new(amount),
                },
            );
        }
        Ok(base)
    }

    // type := IDENTIFIER .
    fn type_name(&mut self) -> Result<Type> {
        let ident = self.expect_retrieve(NonTerminal::Type)?;
        Ok(Type::from_name(&ident.lexeme))
    }

    /// Build the node for `left op right`
    fn binary(&mut self, left: Node, op: Token, right: Node) -> Node {
        let (left, right) = (Box::new(left), Box::new(right));
        let kind = match op.kind {
            TokenKind::Add => NodeKind::Binary { op: BinaryOp::Add, left, right },
            TokenKind::Sub => NodeKind::Binary { op: BinaryOp::Sub, left, right },
            TokenKind::Or => NodeKind::Binary { op: BinaryOp::Or, left, right },
            TokenKind::Mul => NodeKind::Binary { op: BinaryOp::Mul, left, right },
            TokenKind::Div => NodeKind::Binary { op: BinaryOp::Div, left, right },
            TokenKind::And => NodeKind::Binary { op: BinaryOp::And, left, right },
            TokenKind::GreaterEqual => NodeKind::Comparison { op: CompareOp::Ge, left, right },
            TokenKind::LesserEqual => NodeKind::Comparison { op: CompareOp::Le, left, right },
            TokenKind::NotEqual => NodeKind::Comparison { op: CompareOp::Ne, left, right },
            TokenKind::Equal => NodeKind::Comparison { op: CompareOp::Eq, left, right },
            TokenKind::GreaterThan => NodeKind::Comparison { op: CompareOp::Gt, left, right },
            _ => NodeKind::Comparison { op: CompareOp::Lt, left, right },
        };
        self.node(op.position, kind)
    }

    // expression0 := expression1 [ op0 expression1 ] .
    fn expression0(&mut self) -> Result<Node> {
        let left = self.expression1()?;
        if self.have(NonTerminal::Op0) {
            let op = self.expect_retrieve(NonTerminal::Op0)?;
            let right = self.expression1()?;
            return Ok(self.binary(left, op, right));
        }
        Ok(left)
    }

    // expression1 := expression2 { op1 expression2 } .
    fn expression1(&mut self) -> Result<Node> {
        let mut left = self.expression2()?;
        while self.have(NonTerminal::Op1) {
            let op = self.expect_retrieve(NonTerminal::Op1)?;
            let right = self.expression2()?;
            left = self.binary(left, op, right);
        }
        Ok(left)
    }

    // expression2 := expression3 { op2 expression3 } .
    fn expression2(&mut self) -> Result<Node> {
        let mut left = self.expression3()?;
        while self.have(NonTerminal::Op2) {
            let op = self.expect_retrieve(NonTerminal::Op2)?;
            let right = self.expression3()?;
            left = self.binary(left, op, right);
        }
        Ok(left)
    }

    // expression3 := "not" expression3 | "(" expression0 ")" | designator
    //              | call-expression | literal .
    fn expression3(&mut self) -> Result<Node> {
        let position = self.position();

        if self.accept(TokenKind::Not) {
            let inner = self.expression3()?;
            Ok(self.node(position, NodeKind::LogicalNot(Box::new(inner))))
        } else if self.accept(TokenKind::OpenParen) {
            let inner = self.expression0()?;
            self.expect(TokenKind::CloseParen)?;
            Ok(inner)
        } else if self.have(NonTerminal::Designator) {
            let address = self.designator()?;
            Ok(self.node(position, NodeKind::Dereference(Box::new(address))))
        } else if self.have(NonTerminal::CallExpression) {
            self.call_expression()
        } else if self.have(NonTerminal::Literal) {
            self.literal()
        } else {
            Err(self.syntax_error(NonTerminal::Expression3))
        }
    }

    // call-expression := "::" IDENTIFIER "(" expression-list ")" .
    fn call_expression(&mut self) -> Result<Node> {
        let position = self.position();
        self.expect(TokenKind::Call)?;
        let ident = self.expect_retrieve(TokenKind::Identifier)?;
        let function = self.try_resolve(&ident);
        self.expect(TokenKind::OpenParen)?;
        let arguments = self.expression_list()?;
        self.expect(TokenKind::CloseParen)?;

        Ok(self.node(
            position,
            NodeKind::Call {
                function,
                arguments: Box::new(arguments),
            },
        ))
    }

    // expression-list := [ expression0 { "," expression0 } ] .
    fn expression_list(&mut self) -> Result<Node> {
        let position = self.position();
        let mut expressions = Vec::new();
        if self.have(NonTerminal::Expression0) {
            loop {
                expressions.push(self.expression0()?);
                if !self.accept(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(self.node(position, NodeKind::ExpressionList(expressions)))
    }

    // parameter := IDENTIFIER ":" type .
    fn parameter(&mut self) -> Result<SymbolRef> {
        let ident = self.expect_retrieve(TokenKind::Identifier)?;
        let symbol = self.try_declare(&ident);
        self.expect(TokenKind::Colon)?;
        symbol.set_type(self.type_name()?);
        Ok(symbol)
    }

    // parameter-list := [ parameter { "," parameter } ] .
    fn parameter_list(&mut self) -> Result<Vec<SymbolRef>> {
        let mut parameters = Vec::new();
        if self.have(NonTerminal::Parameter) {
            loop {
                parameters.push(self.parameter()?);
                if !self.accept(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(parameters)
    }

    // variable-declaration := "var" IDENTIFIER ":" type ";" .
    fn variable_declaration(&mut self) -> Result<Node> {
        let position = self.position();
        self.expect(TokenKind::Var)?;
        let ident = self.expect_retrieve(TokenKind::Identifier)?;
        let symbol = self.try_declare(&ident);
        self.expect(TokenKind::Colon)?;
        symbol.set_type(self.type_name()?);
        self.expect(TokenKind::Semicolon)?;

        Ok(self.node(position, NodeKind::VariableDeclaration(symbol)))
    }

    // array-declaration := "array" IDENTIFIER ":" type "[" INTEGER "]" { "[" INTEGER "]" } ";" .
    fn array_declaration(&mut self) -> Result<Node> {
        let position = self.position();
        self.expect(TokenKind::Array)?;
        let ident = self.expect_retrieve(TokenKind::Identifier)?;
        let symbol = self.try_declare(&ident);
        self.expect(TokenKind::Colon)?;
        let base = self.type_name()?;

        let mut extents = Vec::new();
        self.expect(TokenKind::OpenBracket)?;
        extents.push(self.extent()?);
        self.expect(TokenKind::CloseBracket)?;
        while self.accept(TokenKind::OpenBracket) {
            extents.push(self.extent()?);
            self.expect(TokenKind::CloseBracket)?;
        }
        self.expect(TokenKind::Semicolon)?;

        // The first extent listed is the outermost dimension
        let ty = extents
            .into_iter()
            .rev()
            .fold(base, |inner, extent| extent.map_or_else(|e| e, |n| Type::array(n, inner)));
        symbol.set_type(ty);
        Ok(self.node(position, NodeKind::ArrayDeclaration(symbol)))
    }

    /// An array extent; an unusable one becomes the error type of the array
    fn extent(&mut self) -> Result<std::result::Result<usize, Type>> {
        let token = self.expect_retrieve(TokenKind::Integer)?;
        Ok(token
            .lexeme
            .parse::<usize>()
            .map_err(|_| Type::error(format!("Array extent {} is out of range.", token.lexeme))))
    }

    // function-definition := "func" IDENTIFIER "(" parameter-list ")" ":" type statement-block .
    fn function_definition(&mut self) -> Result<Node> {
        let position = self.position();
        self.expect(TokenKind::Func)?;
        let ident = self.expect_retrieve(TokenKind::Identifier)?;
        let function = self.try_declare(&ident);
        log::debug!("parsing function {}", ident.lexeme);

        self.expect(TokenKind::OpenParen)?;
        self.symbols.push_scope();
        let parameters = self.parameter_list()?;
        self.expect(TokenKind::CloseParen)?;
        self.expect(TokenKind::Colon)?;

        let params = parameters.iter().map(|p| p.ty()).collect();
        function.set_type(Type::func(params, self.type_name()?));
        let body = self.statement_block()?;
        self.symbols.pop_scope();

        Ok(self.node(
            position,
            NodeKind::FunctionDefinition {
                function,
                parameters,
                body: Box::new(body),
            },
        ))
    }

    // declaration := variable-declaration | array-declaration | function-definition .
    fn declaration(&mut self) -> Result<Node> {
        if self.have(NonTerminal::VariableDeclaration) {
            self.variable_declaration()
        } else if self.have(NonTerminal::ArrayDeclaration) {
            self.array_declaration()
        } else if self.have(NonTerminal::FunctionDefinition) {
            self.function_definition()
        } else {
            Err(self.syntax_error(NonTerminal::Declaration))
        }
    }

    // declaration-list := { declaration } .
    fn declaration_list(&mut self) -> Result<Node> {
        let position = self.position();
        let mut declarations = Vec::new();
        while self.have(NonTerminal::Declaration) {
            declarations.push(self.declaration()?);
        }
        Ok(self.node(position, NodeKind::DeclarationList(declarations)))
    }

    // assignment-statement := "let" designator "=" expression0 ";" .
    fn assignment_statement(&mut self) -> Result<Node> {
        let position = self.position();
        self.expect(TokenKind::Let)?;
        let destination = self.designator()?;
        self.expect(TokenKind::Assign)?;
        let source = self.expression0()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(self.node(
            position,
            NodeKind::Assignment {
                destination: Box::new(destination),
                source: Box::new(source),
            },
        ))
    }

    // call-statement := call-expression ";" .
    fn call_statement(&mut self) -> Result<Node> {
        let call = self.call_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(call)
    }

    // if-statement := "if" expression0 statement-block [ "else" statement-block ] .
    fn if_statement(&mut self) -> Result<Node> {
        let position = self.position();
        self.expect(TokenKind::If)?;
        let condition = self.expression0()?;

        self.symbols.push_scope();
        let then_block = self.statement_block()?;
        self.symbols.pop_scope();

        let else_block = if self.accept(TokenKind::Else) {
            self.symbols.push_scope();
            let block = self.statement_block()?;
            self.symbols.pop_scope();
            block
        } else {
            let position = self.position();
            self.node(position, NodeKind::StatementList(Vec::new()))
        };

        Ok(self.node(
            position,
            NodeKind::IfElseBranch {
                condition: Box::new(condition),
                then_block: Box::new(then_block),
                else_block: Box::new(else_block),
            },
        ))
    }

    // while-statement := "while" expression0 statement-block .
    fn while_statement(&mut self) -> Result<Node> {
        let position = self.position();
        self.expect(TokenKind::While)?;
        let condition = self.expression0()?;

        self.symbols.push_scope();
        let body = self.statement_block()?;
        self.symbols.pop_scope();

        Ok(self.node(
            position,
            NodeKind::WhileLoop {
                condition: Box::new(condition),
                body: Box::new(body),
            },
        ))
    }

    // return-statement := "return" [ expression0 ] ";" .
    fn return_statement(&mut self) -> Result<Node> {
        let position = self.position();
        self.expect(TokenKind::Return)?;
        let value = if self.have(NonTerminal::Expression0) {
            Some(Box::new(self.expression0()?))
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(self.node(position, NodeKind::Return(value)))
    }

    // statement := variable-declaration | array-declaration | call-statement
    //            | assignment-statement | if-statement | while-statement | return-statement .
    fn statement(&mut self) -> Result<Node> {
        if self.have(NonTerminal::VariableDeclaration) {
            self.variable_declaration()
        } else if self.have(NonTerminal::ArrayDeclaration) {
            self.array_declaration()
        } else if self.have(NonTerminal::CallStatement) {
            self.call_statement()
        } else if self.have(NonTerminal::AssignmentStatement) {
            self.assignment_statement()
        } else if self.have(NonTerminal::IfStatement) {
            self.if_statement()
        } else if self.have(NonTerminal::WhileStatement) {
            self.while_statement()
        } else if self.have(NonTerminal::ReturnStatement) {
            self.return_statement()
        } else {
            Err(self.syntax_error(NonTerminal::Statement))
        }
    }

    // statement-list := { statement } .
    fn statement_list(&mut self) -> Result<Node> {
        let position = self.position();
        let mut statements = Vec::new();
        while self.have(NonTerminal::Statement) {
            statements.push(self.statement()?);
        }
        Ok(self.node(position, NodeKind::StatementList(statements)))
    }

    // statement-block := "{" statement-list "}" .
    fn statement_block(&mut self) -> Result<Node> {
        self.expect(TokenKind::OpenBrace)?;
        let statements = self.statement_list()?;
        self.expect(TokenKind::CloseBrace)?;
        Ok(statements)
    }

    // program := declaration-list EOF .
    fn program(&mut self) -> Result<Node> {
        let declarations = self.declaration_list()?;
        self.expect(TokenKind::Eof)?;
        Ok(declarations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Node, Parser) {
        let mut parser = Parser::from_source(source);
        let root = parser.parse();
        (root, parser)
    }

    fn declarations(root: &Node) -> &[Node] {
        match &root.kind {
            NodeKind::DeclarationList(items) => items,
            other => panic!("expected a declaration list, got {:?}", other),
        }
    }

    fn function_body(decl: &Node) -> &[Node] {
        match &decl.kind {
            NodeKind::FunctionDefinition { body, .. } => match &body.kind {
                NodeKind::StatementList(items) => items,
                other => panic!("expected a statement list, got {:?}", other),
            },
            other => panic!("expected a function, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        let (root, parser) = parse("");
        assert!(!parser.has_error());
        assert!(declarations(&root).is_empty());
    }

    #[test]
    fn test_global_and_function() {
        let (root, parser) = parse("var x: int; func main(): void { let x = 1; return; }");
        assert!(!parser.has_error(), "{}", parser.error_report());
        let decls = declarations(&root);
        assert_eq!(decls.len(), 2);

        match &decls[1].kind {
            NodeKind::FunctionDefinition { function, parameters, .. } => {
                assert_eq!(function.name(), "main");
                assert_eq!(function.ty().to_string(), "func(TypeList()):void");
                assert!(parameters.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }

        let body = function_body(&decls[1]);
        assert!(matches!(body[0].kind, NodeKind::Assignment { .. }));
        assert!(matches!(body[1].kind, NodeKind::Return(None)));
    }

    #[test]
    fn test_unresolved_name_reports_scopes() {
        let (_, parser) = parse("func main(): void { let y = 1; return; }");
        assert_eq!(
            parser.error_report(),
            "ResolveSymbolError(1,25)[Could not find y.]\n\
             Symbol(readInt:func(TypeList()):int)\n\
             Symbol(readFloat:func(TypeList()):float)\n\
             Symbol(printBool:func(TypeList(bool)):void)\n\
             Symbol(printInt:func(TypeList(int)):void)\n\
             Symbol(printFloat:func(TypeList(float)):void)\n\
             Symbol(println:func(TypeList()):void)\n\
             Symbol(main:func(TypeList()):void)\n\
             \n"
        );
    }

    #[test]
    fn test_redeclaration_is_soft() {
        let (root, parser) = parse("var a: int;\nvar a: float;\nvar b: bool;");
        assert!(parser.has_error());
        let report = parser.error_report();
        assert!(report.starts_with("DeclareSymbolError(2,5)[a already exists.]\n"));
        assert!(report.contains("Symbol(a:int)\n"));
        assert_eq!(declarations(&root).len(), 3);
    }

    #[test]
    fn test_syntax_error_aborts() {
        let (root, parser) = parse("var x: int");
        assert_eq!(
            parser.error_report(),
            "SyntaxError(1,11)[Expected SEMICOLON but got EOF.]\n"
        );
        assert!(root.is_error());
        assert_eq!(root.position, Position::new(1, 11));
        match root.kind {
            NodeKind::Error(message) => assert_eq!(message, "Could not complete parsing."),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_expression_names_nonterminal() {
        let (_, parser) = parse("func main(): void { let x = ; }");
        assert!(parser
            .error_report()
            .contains("[Expected a token from EXPRESSION3 but got SEMICOLON.]"));
    }

    #[test]
    fn test_garbage_at_top_level() {
        let (root, parser) = parse("# var");
        assert!(root.is_error());
        assert_eq!(
            parser.error_report(),
            "SyntaxError(1,1)[Expected EOF but got ERROR.]\n"
        );
    }

    #[test]
    fn test_array_extents_outermost_first() {
        let (root, parser) = parse("array a: int[2][3];");
        assert!(!parser.has_error());
        match &declarations(&root)[0].kind {
            NodeKind::ArrayDeclaration(symbol) => {
                assert_eq!(symbol.ty(), Type::array(2, Type::array(3, Type::Int)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        let (root, parser) = parse("func f(): int { return 1 + 2 * 3 < 4; }");
        assert!(!parser.has_error());
        let body = function_body(&declarations(&root)[0]);
        let NodeKind::Return(Some(value)) = &body[0].kind else {
            panic!("expected a return");
        };
        let NodeKind::Comparison { op, left, .. } = &value.kind else {
            panic!("expected a comparison, got {}", value);
        };
        assert_eq!(*op, CompareOp::Lt);
        let NodeKind::Binary { op, right, .. } = &left.kind else {
            panic!("expected an addition");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(right.kind, NodeKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_designators() {
        let (root, parser) =
            parse("array a: int[2][3];\nfunc main(): void { let a[0][1] = a[1][2]; }");
        assert!(!parser.has_error());
        let body = function_body(&declarations(&root)[1]);
        let NodeKind::Assignment { destination, source } = &body[0].kind else {
            panic!("expected an assignment");
        };
        let NodeKind::Index { base, .. } = &destination.kind else {
            panic!("expected an index");
        };
        assert!(matches!(base.kind, NodeKind::Index { .. }));
        let NodeKind::Dereference(address) = &source.kind else {
            panic!("expected a dereference");
        };
        assert!(matches!(address.kind, NodeKind::Index { .. }));
    }

    #[test]
    fn test_block_scopes() {
        let source = "func f(x: int): void {\n\
                      if true { var y: int; } else { var y: bool; }\n\
                      while false { var x: float; }\n\
                      let y = 1;\n\
                      }";
        let (_, parser) = parse(source);
        let report = parser.error_report();
        assert!(report.starts_with("ResolveSymbolError(4,5)[Could not find y.]"));
        assert!(!report.contains("DeclareSymbolError"));
    }

    #[test]
    fn test_parameter_and_local_share_a_scope() {
        let (_, parser) = parse("func f(x: int): void { var x: int; }");
        assert!(parser
            .error_report()
            .starts_with("DeclareSymbolError(1,28)[x already exists.]"));
    }

    #[test]
    fn test_recursive_call_resolves() {
        let (_, parser) = parse("func f(n: int): int { return ::f(n - 1); }");
        assert!(!parser.has_error(), "{}", parser.error_report());
    }

    #[test]
    fn test_unknown_type_name() {
        let (root, parser) = parse("var s: string;");
        assert!(!parser.has_error());
        match &declarations(&root)[0].kind {
            NodeKind::VariableDeclaration(symbol) => {
                assert_eq!(symbol.ty(), Type::error("Unknown type: string."));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_node_ids_are_unique() {
        let (root, _) = parse("func main(): void { ::printInt(1 + 2); ::println(); }");
        let mut ids = Vec::new();
        let mut stack = vec![&root];
        while let Some(node) = stack.pop() {
            ids.push(node.id);
            stack.extend(node.children());
        }
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }
}
