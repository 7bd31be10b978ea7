//! Lexical tokens and their decorative (whitespace/comment) trivia.
//!
//! Tokens carry the exact source lexeme, a byte-accurate [`SourcePos`], and
//! the run of decorative trivia that *precedes* them. Trailing trivia always
//! belongs to the next token; the EOF token collects whatever trails the
//! last real token of a file.

use std::fmt;

use smallvec::SmallVec;
use strum::{Display, IntoStaticStr};

use crate::source::LogicalUri;

/// The closed set of token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    /// The blank identifier `_`.
    Blank,
    Int,
    Float,
    String,
    Char,

    Assign,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Bang,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
    RightArrow,

    Colon,
    Dot,
    Comma,
    At,
    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Lbracket,
    Rbracket,

    Module,
    Import,
    Data,
    Enum,
    Annotation,
    Extern,
    Func,
    Let,
    Type,
    Return,
    If,
    Else,
    For,
    True,
    False,
    Null,

    /// Synthetic kind for the token representing a whole module directory.
    ModuleDirectory,
}

/// Kinds of decorative trivia attached to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DecorativeKind {
    /// Whitespace without a newline.
    Inline,
    /// Whitespace containing at least one newline.
    Multi,
    /// A `#` or `//` comment with its text normalised (marker, one optional
    /// leading space, and the trailing newline stripped).
    Comment,
}

/// A single piece of decorative trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorative {
    pub kind: DecorativeKind,
    pub literal: String,
}

/// Byte-accurate position of a token within a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePos {
    pub uri: LogicalUri,
    pub offset: usize,
}

impl SourcePos {
    #[must_use]
    pub fn new(uri: LogicalUri, offset: usize) -> Self {
        Self { uri, offset }
    }
}

/// A lexical token: kind, exact (or canonicalised) lexeme, position, and
/// leading decorative trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub pos: SourcePos,
    pub leading: SmallVec<[Decorative; 2]>,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, literal: impl Into<String>, pos: SourcePos) -> Self {
        Self { kind, literal: literal.into(), pos, leading: SmallVec::new() }
    }

    /// True when every leading decorative is inline whitespace, i.e. the
    /// token continues the current line.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.leading.iter().all(|d| d.kind == DecorativeKind::Inline)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.literal)
    }
}

/// Distinguishes keywords from plain identifiers.
#[must_use]
pub fn lookup_ident(literal: &str) -> TokenKind {
    match literal {
        "module" => TokenKind::Module,
        "import" => TokenKind::Import,
        "data" => TokenKind::Data,
        "enum" => TokenKind::Enum,
        "annotation" => TokenKind::Annotation,
        "extern" => TokenKind::Extern,
        "func" => TokenKind::Func,
        "let" => TokenKind::Let,
        "type" => TokenKind::Type,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "_" => TokenKind::Blank,
        _ => TokenKind::Ident,
    }
}
