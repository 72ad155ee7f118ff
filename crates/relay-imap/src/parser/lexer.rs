//! Tokenizer for server responses.
//!
//! Breaks one complete response (literals inlined, as produced by the framed
//! reader) into the token classes of the RFC 9051 grammar.

use crate::{Error, Result};

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Atom (unquoted string without special characters).
    Atom(&'a str),
    /// Quoted string, escapes resolved.
    Quoted(String),
    /// Literal string with size prefix `{n}`.
    Literal(Vec<u8>),
    /// Number that fits in 32 bits.
    Number(u32),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Single space.
    Space,
    /// `*` (untagged prefix or wildcard).
    Asterisk,
    /// `+` (continuation prefix).
    Plus,
    /// `NIL`
    Nil,
    /// CRLF line ending.
    Crlf,
    /// End of input.
    Eof,
}

/// Lexer over one response.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns true if at end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes `byte` if it is next.
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Reads the next token.
    ///
    /// # Errors
    ///
    /// Fails on bytes that cannot start a token, a bare CR, malformed quoted
    /// strings and literals that run past the input.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b' ' => Some(Token::Space),
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            b'*' => Some(Token::Asterisk),
            b'+' => Some(Token::Plus),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(token);
        }

        match byte {
            b'\r' if self.input.get(self.pos + 1) == Some(&b'\n') => {
                self.pos += 2;
                Ok(Token::Crlf)
            }
            b'\r' => Err(self.error("bare CR")),
            b'"' => self.read_quoted(),
            b'{' => self.read_literal(),
            _ if is_atom_char(byte) => Ok(self.lex_atom()),
            _ => Err(self.error(&format!("unexpected byte {byte:#04x}"))),
        }
    }

    fn read_quoted(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => out.push(c),
                    Some(c) => return Err(self.error(&format!("invalid escape \\{}", c as char))),
                    None => return Err(self.error("unterminated quoted string")),
                },
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("unterminated quoted string"));
                }
                Some(c) => out.push(c),
            }
        }
        // Servers occasionally put raw 8-bit text in quoted strings.
        Ok(Token::Quoted(String::from_utf8_lossy(&out).into_owned()))
    }

    fn read_literal(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let size: usize = std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("invalid literal size"))?;
        self.eat(b'+');
        if !self.eat(b'}') || !self.eat(b'\r') || !self.eat(b'\n') {
            return Err(self.error("malformed literal prefix"));
        }
        let end = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("literal runs past end of input"))?;
        let data = self.input[self.pos..end].to_vec();
        self.pos = end;
        Ok(Token::Literal(data))
    }

    fn lex_atom(&mut self) -> Token<'a> {
        let start = self.pos;
        while self.peek().is_some_and(is_atom_char) {
            self.pos += 1;
        }
        let bytes = &self.input[start..self.pos];
        // Atom chars are ASCII, so this cannot fail.
        let s = std::str::from_utf8(bytes).unwrap_or_default();
        if s.eq_ignore_ascii_case("NIL") {
            return Token::Nil;
        }
        if bytes.iter().all(u8::is_ascii_digit)
            && let Ok(n) = s.parse()
        {
            return Token::Number(n);
        }
        Token::Atom(s)
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Consumes the next token and checks it is `expected`.
    ///
    /// # Errors
    ///
    /// Fails if a different token comes next.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {expected:?}, got {token:?}")))
        }
    }

    /// Consumes a single space.
    ///
    /// # Errors
    ///
    /// Fails if the next byte is not a space.
    pub fn expect_space(&mut self) -> Result<()> {
        if self.eat(b' ') {
            Ok(())
        } else {
            Err(self.error("expected space"))
        }
    }

    /// Reads an atom, quoted string or literal as text.
    ///
    /// # Errors
    ///
    /// Fails on any other token.
    pub fn read_astring(&mut self) -> Result<String> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s.to_string()),
            Token::Number(n) => Ok(n.to_string()),
            Token::Quoted(s) => Ok(s),
            Token::Literal(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
            token => Err(self.error(&format!("expected string, got {token:?}"))),
        }
    }

    /// Reads a number.
    ///
    /// # Errors
    ///
    /// Fails if the next token is not a 32-bit number.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("expected number, got {token:?}"))),
        }
    }

    /// Reads an atom.
    ///
    /// # Errors
    ///
    /// Fails if the next token is not an atom.
    pub fn read_atom(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("expected atom, got {token:?}"))),
        }
    }

    /// Returns the rest of the line (without CRLF) and consumes it.
    pub fn rest_of_line(&mut self) -> String {
        let remaining = &self.input[self.pos..];
        let end = remaining
            .windows(2)
            .position(|w| w == b"\r\n")
            .unwrap_or(remaining.len());
        let text = String::from_utf8_lossy(&remaining[..end]).into_owned();
        self.pos = (self.pos + end + 2).min(self.input.len());
        text
    }

    /// Skips bytes up to (not including) `byte`, or to the end.
    pub fn skip_until(&mut self, byte: u8) {
        while self.peek().is_some_and(|b| b != byte) {
            self.pos += 1;
        }
    }
}

/// Returns true if the byte may appear in an atom.
///
/// `\` is accepted so flags such as `\Seen` lex as one atom, and `]` is
/// rejected so response codes close cleanly.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    b > 0x20
        && b < 0x7F
        && !matches!(b, b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b'[' | b']')
}
