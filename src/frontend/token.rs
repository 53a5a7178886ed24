//! Token definitions for Crux

use std::fmt;

use serde::Serialize;

use crate::utils::Position;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text for identifiers, numbers and errors; the fixed spelling otherwise
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    /// A token whose lexeme is the kind's fixed spelling
    pub fn fixed(kind: TokenKind, position: Position) -> Self {
        Self::new(kind, kind.default_lexeme(), position)
    }

    pub fn eof(position: Position) -> Self {
        Self::new(TokenKind::Eof, "", position)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, column) = (self.position.line, self.position.column);
        match self.kind {
            TokenKind::Identifier | TokenKind::Integer | TokenKind::Float => write!(
                f,
                "{}({})(lineNum:{}, charPos:{})",
                self.kind, self.lexeme, line, column
            ),
            TokenKind::Error => write!(
                f,
                "{}(Unexpected character: {})(lineNum:{}, charPos:{})",
                self.kind, self.lexeme, line, column
            ),
            _ => write!(f, "{}(lineNum:{}, charPos:{})", self.kind, line, column),
        }
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ============ Keywords ============
    /// and
    And,
    /// or
    Or,
    /// not
    Not,
    /// let
    Let,
    /// var
    Var,
    /// array
    Array,
    /// func
    Func,
    /// if
    If,
    /// else
    Else,
    /// while
    While,
    /// true
    True,
    /// false
    False,
    /// return
    Return,

    // ============ Operators ============
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// >=
    GreaterEqual,
    /// <=
    LesserEqual,
    /// !=
    NotEqual,
    /// ==
    Equal,
    /// >
    GreaterThan,
    /// <
    LessThan,
    /// =
    Assign,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// :
    Colon,
    /// ::
    Call,

    // ============ Delimiters ============
    /// (
    OpenParen,
    /// )
    CloseParen,
    /// {
    OpenBrace,
    /// }
    CloseBrace,
    /// [
    OpenBracket,
    /// ]
    CloseBracket,

    // ============ Literals ============
    Identifier,
    Integer,
    Float,

    // ============ Special ============
    /// Unrecognized character
    Error,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Every kind with a fixed spelling, keywords first
    pub const FIXED: [TokenKind; 34] = [
        TokenKind::And,
        TokenKind::Or,
        TokenKind::Not,
        TokenKind::Let,
        TokenKind::Var,
        TokenKind::Array,
        TokenKind::Func,
        TokenKind::If,
        TokenKind::Else,
        TokenKind::While,
        TokenKind::True,
        TokenKind::False,
        TokenKind::Return,
        TokenKind::Add,
        TokenKind::Sub,
        TokenKind::Mul,
        TokenKind::Div,
        TokenKind::GreaterEqual,
        TokenKind::LesserEqual,
        TokenKind::NotEqual,
        TokenKind::Equal,
        TokenKind::GreaterThan,
        TokenKind::LessThan,
        TokenKind::Assign,
        TokenKind::Comma,
        TokenKind::Semicolon,
        TokenKind::Colon,
        TokenKind::Call,
        TokenKind::OpenParen,
        TokenKind::CloseParen,
        TokenKind::OpenBrace,
        TokenKind::CloseBrace,
        TokenKind::OpenBracket,
        TokenKind::CloseBracket,
    ];

    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::Array
                | TokenKind::Func
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Return
        )
    }

    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "not" => Some(TokenKind::Not),
            "let" => Some(TokenKind::Let),
            "var" => Some(TokenKind::Var),
            "array" => Some(TokenKind::Array),
            "func" => Some(TokenKind::Func),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "return" => Some(TokenKind::Return),
            _ => None,
        }
    }

    /// The fixed spelling of this kind, empty for kinds that carry source text
    pub fn default_lexeme(&self) -> &'static str {
        match self {
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::Array => "array",
            TokenKind::Func => "func",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Return => "return",
            TokenKind::Add => "+",
            TokenKind::Sub => "-",
            TokenKind::Mul => "*",
            TokenKind::Div => "/",
            TokenKind::GreaterEqual => ">=",
            TokenKind::LesserEqual => "<=",
            TokenKind::NotEqual => "!=",
            TokenKind::Equal => "==",
            TokenKind::GreaterThan => ">",
            TokenKind::LessThan => "<",
            TokenKind::Assign => "=",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Call => "::",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::Identifier
            | TokenKind::Integer
            | TokenKind::Float
            | TokenKind::Error
            | TokenKind::Eof => "",
        }
    }

    /// The diagnostic name of this kind, as it appears in syntax errors
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::Let => "LET",
            TokenKind::Var => "VAR",
            TokenKind::Array => "ARRAY",
            TokenKind::Func => "FUNC",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Return => "RETURN",
            TokenKind::Add => "ADD",
            TokenKind::Sub => "SUB",
            TokenKind::Mul => "MUL",
            TokenKind::Div => "DIV",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::LesserEqual => "LESSER_EQUAL",
            TokenKind::NotEqual => "NOT_EQUAL",
            TokenKind::Equal => "EQUAL",
            TokenKind::GreaterThan => "GREATER_THAN",
            TokenKind::LessThan => "LESS_THAN",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Colon => "COLON",
            TokenKind::Call => "CALL",
            TokenKind::OpenParen => "OPEN_PAREN",
            TokenKind::CloseParen => "CLOSE_PAREN",
            TokenKind::OpenBrace => "OPEN_BRACE",
            TokenKind::CloseBrace => "CLOSE_BRACE",
            TokenKind::OpenBracket => "OPEN_BRACKET",
            TokenKind::CloseBracket => "CLOSE_BRACKET",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Integer => "INTEGER",
            TokenKind::Float => "FLOAT",
            TokenKind::Error => "ERROR",
            TokenKind::Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
