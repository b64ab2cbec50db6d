use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LeftParen,
    RightParen,

    // an identifier right after '(' names the call; anywhere else it is a var
    Call,
    Var,

    // literals, kept as raw lexemes until the parser interprets them
    Number,
    String,
    Bool,

    Eof,

    // terminates the stream; the text carries the lexer's message
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LeftParen => "left paren",
            TokenKind::RightParen => "right paren",
            TokenKind::Call => "call",
            TokenKind::Var => "var",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Bool => "bool",
            TokenKind::Eof => "EOF",
            TokenKind::Error => "error",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::Error => write!(f, "{}", self.text),
            _ => write!(f, "{:?}", self.text),
        }
    }
}
