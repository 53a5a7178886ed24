//! Lexer for Crux
//!
//! Converts source code into a stream of tokens. Scanning is an explicit
//! state machine; every call to [`Lexer::next_token`] starts in
//! [`State::Start`] and runs until a token is complete.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::Position;

/// Scanner states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    /// Saw `:`, deciding between `:` and `::`
    Colon,
    /// Saw `=`, deciding between `=` and `==`
    Equal,
    /// Saw `<`, deciding between `<` and `<=`
    Less,
    /// Saw `>`, deciding between `>` and `>=`
    Greater,
    /// Saw `!`, only `!=` is valid
    Bang,
    /// Saw `/`, deciding between division and a comment
    Slash,
    Comment,
    Identifier,
    Integer,
    Float,
}

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Line of the next unread character
    line: usize,
    /// Column of the next unread character
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Advance to the next character, keeping line and column in step
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn is_identifier_char(c: char) -> bool {
        c == '_' || c.is_alphanumeric()
    }

    /// Finish a two-character operator: `second` selects `long`, anything else `short`
    fn pair(&mut self, second: char, long: TokenKind, short: TokenKind, start: Position) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            Token::fixed(long, start)
        } else {
            Token::fixed(short, start)
        }
    }

    /// Get the next token
    ///
    /// Once the input is exhausted every call returns an EOF token at the
    /// same position.
    pub fn next_token(&mut self) -> Token {
        let mut state = State::Start;
        let mut start = self.position();
        let mut lexeme = String::new();

        loop {
            match state {
                State::Start => {
                    start = self.position();
                    let Some(c) = self.peek() else {
                        return Token::eof(start);
                    };

                    let single = match c {
                        '+' => Some(TokenKind::Add),
                        '-' => Some(TokenKind::Sub),
                        '*' => Some(TokenKind::Mul),
                        ',' => Some(TokenKind::Comma),
                        ';' => Some(TokenKind::Semicolon),
                        '(' => Some(TokenKind::OpenParen),
                        ')' => Some(TokenKind::CloseParen),
                        '{' => Some(TokenKind::OpenBrace),
                        '}' => Some(TokenKind::CloseBrace),
                        '[' => Some(TokenKind::OpenBracket),
                        ']' => Some(TokenKind::CloseBracket),
                        _ => None,
                    };
                    if let Some(kind) = single {
                        self.advance();
                        return Token::fixed(kind, start);
                    }

                    match c {
                        ' ' | '\t' | '\r' | '\n' => {
                            self.advance();
                        }
                        ':' => {
                            self.advance();
                            state = State::Colon;
                        }
                        '=' => {
                            self.advance();
                            state = State::Equal;
                        }
                        '<' => {
                            self.advance();
                            state = State::Less;
                        }
                        '>' => {
                            self.advance();
                            state = State::Greater;
                        }
                        '!' => {
                            self.advance();
                            state = State::Bang;
                        }
                        '/' => {
                            self.advance();
                            state = State::Slash;
                        }
                        c if c == '_' || c.is_alphabetic() => state = State::Identifier,
                        c if c.is_ascii_digit() => state = State::Integer,
                        c => {
                            self.advance();
                            return Token::new(TokenKind::Error, c.to_string(), start);
                        }
                    }
                }
                State::Colon => return self.pair(':', TokenKind::Call, TokenKind::Colon, start),
                State::Equal => return self.pair('=', TokenKind::Equal, TokenKind::Assign, start),
                State::Less => {
                    return self.pair('=', TokenKind::LesserEqual, TokenKind::LessThan, start)
                }
                State::Greater => {
                    return self.pair('=', TokenKind::GreaterEqual, TokenKind::GreaterThan, start)
                }
                State::Bang => {
                    if self.peek() == Some('=') {
                        self.advance();
                        return Token::fixed(TokenKind::NotEqual, start);
                    }
                    return Token::new(TokenKind::Error, "!", start);
                }
                State::Slash => {
                    if self.peek() == Some('/') {
                        self.advance();
                        state = State::Comment;
                    } else {
                        return Token::fixed(TokenKind::Div, start);
                    }
                }
                State::Comment => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    state = State::Start;
                }
                State::Identifier => {
                    while let Some(c) = self.peek().filter(|&c| Self::is_identifier_char(c)) {
                        lexeme.push(c);
                        self.advance();
                    }

                    // Longest match: `andy` is an identifier, `and` a keyword
                    let kind = TokenKind::keyword_from_str(&lexeme).unwrap_or(TokenKind::Identifier);
                    return Token::new(kind, lexeme, start);
                }
                State::Integer => {
                    while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                        lexeme.push(c);
                        self.advance();
                    }

                    if self.peek() == Some('.') {
                        lexeme.push('.');
                        self.advance();
                        state = State::Float;
                    } else {
                        return Token::new(TokenKind::Integer, lexeme, start);
                    }
                }
                State::Float => {
                    while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                        lexeme.push(c);
                        self.advance();
                    }
                    return Token::new(TokenKind::Float, lexeme, start);
                }
            }
        }
    }

    /// Tokenize the entire source, up to and including the EOF token
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
