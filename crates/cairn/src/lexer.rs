//! Byte-driven lexer producing tokens with attached decorative trivia.
//!
//! The input is read once in full. Tokens are produced on demand via
//! [`Lexer::next_token`]; the lexer never fails, malformed input surfaces as
//! `TokenKind::Illegal` tokens which the parser reports on consumption.

use std::io;

use smallvec::SmallVec;

use crate::{
    source::{LogicalUri, Source},
    token::{Decorative, DecorativeKind, SourcePos, Token, TokenKind, lookup_ident},
};

pub struct Lexer {
    uri: LogicalUri,
    input: Vec<u8>,
    /// Start of the in-progress token.
    start_pos: usize,
    /// Position of the current byte under examination.
    curr_pos: usize,
    /// Reading position (one past the current byte).
    peek_pos: usize,
    /// Current byte, `0` at end of input.
    ch: u8,
}

impl Lexer {
    /// Reads the source in full and positions the lexer on its first byte.
    pub fn new(src: &dyn Source) -> io::Result<Self> {
        let input = src.read()?;
        Ok(Self::from_bytes(src.uri().clone(), input))
    }

    #[must_use]
    pub fn from_bytes(uri: LogicalUri, input: Vec<u8>) -> Self {
        let mut lexer = Self { uri, input, start_pos: 0, curr_pos: 0, peek_pos: 0, ch: 0 };
        lexer.advance();
        lexer
    }

    /// Produces the next token, attaching all decorative trivia that
    /// precedes it. At end of input an `Eof` token is returned (repeatedly),
    /// carrying whatever trivia trails the last real token.
    pub fn next_token(&mut self) -> Token {
        let leading = self.parse_leading_decoratives();
        self.start_pos = self.curr_pos;

        let mut tok = match self.ch {
            b'!' => {
                if self.peek_char() == b'=' {
                    self.advance();
                    self.make_token(TokenKind::Neq, "!=")
                } else {
                    self.single_token(TokenKind::Bang)
                }
            }
            b'+' => self.single_token(TokenKind::Plus),
            b'-' => {
                if self.peek_char() == b'>' {
                    self.advance();
                    self.make_token(TokenKind::RightArrow, "->")
                } else {
                    self.single_token(TokenKind::Minus)
                }
            }
            b'*' => self.single_token(TokenKind::Asterisk),
            b'/' => self.single_token(TokenKind::Slash),
            b'%' => self.single_token(TokenKind::Percent),
            b'<' => {
                if self.peek_char() == b'=' {
                    self.advance();
                    self.make_token(TokenKind::Lte, "<=")
                } else {
                    self.single_token(TokenKind::Lt)
                }
            }
            b'>' => {
                if self.peek_char() == b'=' {
                    self.advance();
                    self.make_token(TokenKind::Gte, ">=")
                } else {
                    self.single_token(TokenKind::Gt)
                }
            }
            b'=' => match self.peek_char() {
                b'=' => {
                    self.advance();
                    self.make_token(TokenKind::Eq, "==")
                }
                // `=>` is accepted as an alternative arrow spelling.
                b'>' => {
                    self.advance();
                    self.make_token(TokenKind::RightArrow, "->")
                }
                _ => self.single_token(TokenKind::Assign),
            },
            b'&' => {
                if self.peek_char() == b'&' {
                    self.advance();
                    self.make_token(TokenKind::And, "&&")
                } else {
                    self.single_token(TokenKind::Illegal)
                }
            }
            b'|' => {
                if self.peek_char() == b'|' {
                    self.advance();
                    self.make_token(TokenKind::Or, "||")
                } else {
                    self.single_token(TokenKind::Illegal)
                }
            }
            b':' => self.single_token(TokenKind::Colon),
            b'.' => self.single_token(TokenKind::Dot),
            b',' => self.single_token(TokenKind::Comma),
            b'(' => self.single_token(TokenKind::Lparen),
            b')' => self.single_token(TokenKind::Rparen),
            b'{' => self.single_token(TokenKind::Lbrace),
            b'}' => self.single_token(TokenKind::Rbrace),
            b'[' => self.single_token(TokenKind::Lbracket),
            b']' => self.single_token(TokenKind::Rbracket),
            b'@' => self.single_token(TokenKind::At),
            b'"' => {
                let literal = self.parse_string();
                self.make_token(TokenKind::String, literal)
            }
            b'\'' => match self.parse_char() {
                Some(literal) => self.make_token(TokenKind::Char, literal),
                None => {
                    let literal = self.lexeme(self.start_pos, self.curr_pos);
                    self.make_token(TokenKind::Illegal, literal)
                }
            },
            0 => self.make_token(TokenKind::Eof, ""),
            ch if is_letter(ch) => {
                let literal = self.parse_identifier();
                let mut tok = self.make_token(lookup_ident(&literal), literal);
                tok.leading = leading;
                return tok;
            }
            ch if is_digit(ch) => {
                let (literal, kind) = self.parse_number();
                let mut tok = self.make_token(kind, literal);
                tok.leading = leading;
                return tok;
            }
            ch => self.make_token(TokenKind::Illegal, (ch as char).to_string()),
        };

        self.advance();
        tok.leading = leading;
        tok
    }

    fn parse_leading_decoratives(&mut self) -> SmallVec<[Decorative; 2]> {
        let mut decos = SmallVec::new();
        while let Some(deco) = self.parse_decorative() {
            decos.push(deco);
        }
        decos
    }

    fn parse_decorative(&mut self) -> Option<Decorative> {
        match self.ch {
            b'#' => Some(Decorative { kind: DecorativeKind::Comment, literal: self.parse_inline_comment() }),
            b'/' if self.peek_char() == b'/' => {
                self.advance();
                Some(Decorative { kind: DecorativeKind::Comment, literal: self.parse_inline_comment() })
            }
            ch if is_whitespace(ch) => {
                let (kind, literal) = self.skip_whitespace();
                Some(Decorative { kind, literal })
            }
            _ => None,
        }
    }

    /// Consumes a comment body: one optional leading space, the text up to
    /// (and including) the terminating newline.
    fn parse_inline_comment(&mut self) -> String {
        if self.peek_char() == b' ' {
            self.advance();
        }
        let position = self.curr_pos + 1;
        loop {
            self.advance();
            if self.ch == b'\n' {
                self.advance();
                return self.lexeme(position, self.curr_pos - 1);
            }
            if self.ch == 0 {
                return self.lexeme(position, self.curr_pos);
            }
        }
    }

    fn skip_whitespace(&mut self) -> (DecorativeKind, String) {
        let mut kind = DecorativeKind::Inline;
        let mut ws = String::new();
        while is_whitespace(self.ch) {
            if self.ch == b'\n' {
                kind = DecorativeKind::Multi;
            }
            ws.push(self.ch as char);
            self.advance();
        }
        (kind, ws)
    }

    /// Parses a `"…"` literal, decoding `\n`, `\\` and `\"`. Any other
    /// escape keeps the backslash verbatim. An unterminated literal ends
    /// silently at end of input.
    fn parse_string(&mut self) -> String {
        let mut out = String::new();
        let mut escaped = false;
        loop {
            self.advance();
            let ch = self.ch;

            if ch == 0 {
                break;
            }

            if escaped {
                match ch {
                    b'n' => out.push('\n'),
                    b'\\' => out.push('\\'),
                    b'"' => out.push('"'),
                    other => {
                        out.push('\\');
                        out.push(other as char);
                    }
                }
                escaped = false;
                continue;
            }

            if ch == b'\\' {
                escaped = true;
                continue;
            }

            if ch == b'"' {
                break;
            }

            out.push(ch as char);
        }
        out
    }

    /// Captures a `'…'` literal verbatim between the quotes; escape decoding
    /// is deferred to the parser. A newline or end of input inside the
    /// literal fails.
    fn parse_char(&mut self) -> Option<String> {
        let position = self.curr_pos + 1;
        let mut escaped = false;
        loop {
            self.advance();
            if self.ch == 0 || self.ch == b'\n' || self.ch == b'\r' {
                self.peek_pos = self.curr_pos;
                return None;
            }
            if escaped {
                escaped = false;
                continue;
            }
            if self.ch == b'\\' {
                escaped = true;
                continue;
            }
            if self.ch == b'\'' {
                break;
            }
        }
        Some(self.lexeme(position, self.curr_pos))
    }

    fn parse_identifier(&mut self) -> String {
        let position = self.curr_pos;
        while is_letter(self.ch) || is_digit(self.ch) {
            self.advance();
        }
        self.lexeme(position, self.curr_pos)
    }

    fn parse_number(&mut self) -> (String, TokenKind) {
        let position = self.curr_pos;

        if self.ch == b'0' && self.peek_char() == b'x' {
            self.advance();
            self.advance();
            while is_hex_digit(self.ch) {
                self.advance();
            }
            return (self.lexeme(position, self.curr_pos), TokenKind::Int);
        }

        if self.ch == b'0' && matches!(self.peek_char(), b'b' | b'B') {
            self.advance();
            self.advance();
            while is_binary_digit(self.ch) {
                self.advance();
            }
            return (self.lexeme(position, self.curr_pos), TokenKind::Int);
        }

        // Decimal digits; a leading 0 makes the literal octal, which the
        // parser honours when converting.
        while is_digit(self.ch) {
            self.advance();
        }

        if self.ch == b'.' && is_digit(self.peek_char()) {
            self.advance();
            while is_digit(self.ch) {
                self.advance();
            }
            if matches!(self.ch, b'e' | b'E') {
                self.parse_exponent();
            }
            return (self.lexeme(position, self.curr_pos), TokenKind::Float);
        }

        // An exponent on an integer form (e.g. `2e10`) makes it a float.
        if matches!(self.ch, b'e' | b'E') {
            self.parse_exponent();
            return (self.lexeme(position, self.curr_pos), TokenKind::Float);
        }

        (self.lexeme(position, self.curr_pos), TokenKind::Int)
    }

    fn parse_exponent(&mut self) {
        self.advance();
        if matches!(self.ch, b'+' | b'-') {
            self.advance();
        }
        while is_digit(self.ch) {
            self.advance();
        }
    }

    fn advance(&mut self) {
        self.ch = self.input.get(self.peek_pos).copied().unwrap_or(0);
        self.curr_pos = self.peek_pos;
        self.peek_pos += 1;
    }

    fn peek_char(&self) -> u8 {
        self.input.get(self.peek_pos).copied().unwrap_or(0)
    }

    fn lexeme(&self, from: usize, to: usize) -> String {
        String::from_utf8_lossy(&self.input[from..to]).into_owned()
    }

    fn single_token(&self, kind: TokenKind) -> Token {
        self.make_token(kind, (self.ch as char).to_string())
    }

    fn make_token(&self, kind: TokenKind, literal: impl Into<String>) -> Token {
        Token::new(kind, literal, SourcePos::new(self.uri.clone(), self.start_pos))
    }
}

fn is_letter(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_digit(ch: u8) -> bool {
    ch.is_ascii_digit()
}

fn is_hex_digit(ch: u8) -> bool {
    ch.is_ascii_hexdigit()
}

fn is_binary_digit(ch: u8) -> bool {
    ch == b'0' || ch == b'1'
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\r' | b'\n')
}
