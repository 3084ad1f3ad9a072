//! Scanner: turns the active source buffer into a stream of tokens.

use cinder_core::keywords::find_keyword;
use cinder_core::token::{Token, TokenKind};

use crate::source::{SourceBuffer, SourceStack};

pub struct Scanner {
    buffers: SourceStack,
}

impl Scanner {
    pub fn new(source: impl Into<String>) -> Self {
        Scanner {
            buffers: SourceStack::new(SourceBuffer::new(source, None)),
        }
    }

    /// Produce the next token from the current source buffer. `EOF`-stable:
    /// once every buffer is exhausted, repeated calls keep returning `EOF`.
    pub fn next_token(&mut self) -> Token {
        let Some(buf) = self.buffers.current_mut() else {
            return Token::new(TokenKind::Eof, None, 0, 0);
        };

        skip_whitespace_and_comments(buf);
        buf.start = buf.current;

        if buf.is_at_end() {
            return self.handle_eof();
        }

        let line = buf.line;
        let column = buf.column;
        let c = buf.advance();

        if is_alpha(c) {
            return self.identifier(line, column);
        }
        if c.is_ascii_digit() {
            return self.number(line, column);
        }

        let buf = self.buffers.current_mut().unwrap();
        match c {
            b'(' => simple(TokenKind::LeftParen, line, column),
            b')' => simple(TokenKind::RightParen, line, column),
            b'{' => simple(TokenKind::LeftBrace, line, column),
            b'}' => simple(TokenKind::RightBrace, line, column),
            b'[' => simple(TokenKind::LeftBracket, line, column),
            b']' => simple(TokenKind::RightBracket, line, column),
            b'%' => simple(TokenKind::Percent, line, column),
            b',' => simple(TokenKind::Comma, line, column),
            b'^' => simple(TokenKind::Caret, line, column),
            b'.' => simple(TokenKind::Dot, line, column),
            b'-' => simple(TokenKind::Minus, line, column),
            b'+' => simple(TokenKind::Plus, line, column),
            b';' => simple(TokenKind::Semicolon, line, column),
            b'/' => simple(TokenKind::Slash, line, column),
            b'*' => simple(TokenKind::Star, line, column),
            b'&' => simple(TokenKind::And, line, column),
            b'|' => simple(TokenKind::Or, line, column),
            b'!' => {
                let kind = if buf.matches(b'=') { TokenKind::BangEqual } else { TokenKind::Bang };
                simple(kind, line, column)
            }
            b'=' => {
                let kind = if buf.matches(b'=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                simple(kind, line, column)
            }
            b'>' => {
                let kind =
                    if buf.matches(b'=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                simple(kind, line, column)
            }
            b'<' => {
                let kind = if buf.matches(b'=') { TokenKind::LessEqual } else { TokenKind::Less };
                simple(kind, line, column)
            }
            b'"' => self.string(line, column),
            _ => Token::new(
                TokenKind::Error,
                Some("Unexpected character.".to_string()),
                line,
                column,
            ),
        }
    }

    fn handle_eof(&mut self) -> Token {
        // The active buffer is exhausted. If other buffers are queued,
        // switch to the next one and keep scanning; otherwise this is
        // the final EOF for the whole stream.
        if self.buffers.source_buffers_remain() {
            self.buffers.activate_next_buffer();
            return self.next_token();
        }
        let (line, column) = self
            .buffers
            .current()
            .map(|b| (b.line, b.column))
            .unwrap_or((0, 0));
        self.buffers.remove_current_buffer();
        Token::new(TokenKind::Eof, None, line, column)
    }

    fn string(&mut self, line: i32, column: i32) -> Token {
        let buf = self.buffers.current_mut().unwrap();
        loop {
            if buf.is_at_end() {
                return Token::new(
                    TokenKind::Error,
                    Some("Unterminated string.".to_string()),
                    line,
                    column,
                );
            }
            if buf.peek() == b'"' {
                break;
            }
            buf.advance();
        }
        // Lexeme excludes the surrounding quotes.
        let content =
            String::from_utf8_lossy(&buf.as_bytes()[buf.start + 1..buf.current]).into_owned();
        buf.advance(); // closing quote
        Token::new(TokenKind::String, Some(content), line, column)
    }

    fn number(&mut self, line: i32, column: i32) -> Token {
        let buf = self.buffers.current_mut().unwrap();
        while buf.peek().is_ascii_digit() {
            buf.advance();
        }

        let mut kind = TokenKind::Integer;
        if buf.peek() == b'.' && buf.peek_next().is_ascii_digit() {
            kind = TokenKind::Real;
            buf.advance(); // '.'
            while buf.peek().is_ascii_digit() {
                buf.advance();
            }
        }

        Token::new(kind, Some(buf.lexeme()), line, column)
    }

    fn identifier(&mut self, line: i32, column: i32) -> Token {
        let buf = self.buffers.current_mut().unwrap();
        while is_alpha(buf.peek()) || buf.peek().is_ascii_digit() {
            buf.advance();
        }
        let text = buf.lexeme();
        match find_keyword(&text) {
            Some(kind) => Token::new(kind, None, line, column),
            None => Token::new(TokenKind::Identifier, Some(text), line, column),
        }
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn simple(kind: TokenKind, line: i32, column: i32) -> Token {
    Token::new(kind, None, line, column)
}

fn skip_whitespace_and_comments(buf: &mut SourceBuffer) {
    loop {
        match buf.peek() {
            b' ' | b'\t' | b'\r' | b'\x0c' | b'\x0b' | b'\n' => {
                buf.advance();
            }
            b'#' => {
                while buf.peek() != b'\n' && !buf.is_at_end() {
                    buf.advance();
                }
            }
            _ => return,
        }
    }
}
