use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use unicode_xid::UnicodeXID;

use crate::token::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct Lexer {
    source: Vec<char>,

    start: usize,
    current: usize,
    after_open: bool,
}

impl Lexer {
    pub fn from_str(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            after_open: false,
        }
    }

    /// Starts scanning on a background thread and hands back the token
    /// stream. The channel has no buffer, so the thread holds each token
    /// until the consumer takes it; if the consumer goes away the next send
    /// fails and the thread stops.
    pub fn spawn(self) -> Receiver<Token> {
        let (tx, rx) = mpsc::sync_channel(0);
        thread::spawn(move || self.emit_tokens(&tx));
        rx
    }

    fn advance(&mut self) {
        self.current += 1;
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn emit(&mut self, tx: &SyncSender<Token>, kind: TokenKind) -> bool {
        let token = Token::new(kind, self.lexeme());
        self.after_open = kind == TokenKind::LeftParen;
        tx.send(token).is_ok()
    }

    fn emit_error(&self, tx: &SyncSender<Token>, message: String) {
        // an error token terminates the stream; no EOF follows it
        let _ = tx.send(Token::new(TokenKind::Error, message));
    }

    fn emit_tokens(mut self, tx: &SyncSender<Token>) {
        while let Some(c) = self.peek() {
            self.advance();

            let sent = match c {
                '(' => self.emit(tx, TokenKind::LeftParen),
                ')' => self.emit(tx, TokenKind::RightParen),

                ';' => {
                    // comment runs to the end of the line
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    true
                }

                '"' => match self.scan_string() {
                    Ok(()) => self.emit(tx, TokenKind::String),
                    Err(message) => {
                        self.emit_error(tx, message);
                        return;
                    }
                },

                '#' => {
                    self.scan_word();
                    self.emit(tx, TokenKind::Bool)
                }

                '+' | '-' => match self.peek() {
                    Some(next) if next.is_ascii_digit() => {
                        self.scan_number();
                        self.emit(tx, TokenKind::Number)
                    }
                    _ => {
                        self.emit_error(tx, format!("unexpected character {c:?}"));
                        return;
                    }
                },

                _ if c.is_whitespace() => true,

                _ if c.is_ascii_digit() => {
                    self.scan_number();
                    self.emit(tx, TokenKind::Number)
                }

                _ if c.is_xid_start() => {
                    self.scan_word();
                    let kind = if self.after_open {
                        TokenKind::Call
                    } else {
                        TokenKind::Var
                    };
                    self.emit(tx, kind)
                }

                _ => {
                    self.emit_error(tx, format!("unexpected character {c:?}"));
                    return;
                }
            };

            if !sent {
                return;
            }
            self.start = self.current;
        }

        let _ = tx.send(Token::new(TokenKind::Eof, ""));
    }

    fn scan_word(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_xid_continue() {
                break;
            }
            self.advance();
        }
    }

    fn scan_number(&mut self) {
        // greedy over alphanumerics; the parser decides what is legal
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            self.advance();
        }
    }

    fn scan_string(&mut self) -> Result<(), String> {
        // the quotes and escape sequences stay in the lexeme; the parser
        // unquotes later
        loop {
            match self.peek() {
                None => return Err("unterminated string literal".into()),
                Some('\n') => return Err("strings must be on a single line".into()),
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        None => return Err("unterminated string literal".into()),
                        Some('\n') => return Err("strings must be on a single line".into()),
                        Some(_) => self.advance(),
                    }
                }
                Some('"') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => self.advance(),
            }
        }
    }
}
