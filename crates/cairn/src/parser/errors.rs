//! Parse error records and the parser's error helpers.
//!
//! Parse errors are accumulated, never propagated: the parser keeps going
//! and produces a best-effort tree. Rendering against source text happens in
//! [`crate::diagnostics`].

use std::fmt;

use crate::{
    diagnostics,
    parser::{Parser, StatementPosition},
    token::{Token, TokenKind},
};

/// A recoverable syntax error: the offending token, a one-line summary and
/// supporting details.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub token: Token,
    pub summary: String,
    pub details: String,
}

impl ParseError {
    /// Renders the error against the text of the source it points into.
    #[must_use]
    pub fn render(&self, source_text: &str) -> String {
        diagnostics::render(
            self.token.pos.uri.as_str(),
            source_text,
            self.token.pos.offset,
            &self.summary,
            &self.details,
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error: {}, {}", self.summary, self.details)
    }
}

fn kind_list(kinds: &[TokenKind]) -> String {
    let names: Vec<&'static str> = kinds.iter().map(|k| (*k).into()).collect();
    names.join(", ")
}

impl Parser<'_> {
    pub(super) fn detect_error(&mut self, err: ParseError) {
        self.errors.push(err);
    }

    pub(super) fn err_unexpected_token(&mut self, want: &[TokenKind]) {
        self.detect_error(ParseError {
            token: self.cur.clone(),
            summary: format!("unexpected {:?}", self.cur.literal),
            details: format!("want one of [{}]", kind_list(want)),
        });
    }

    pub(super) fn err_unexpected_peek_token(&mut self, want: &[TokenKind]) {
        self.detect_error(ParseError {
            token: self.peek.clone(),
            summary: format!("unexpected {} {:?}", self.peek.kind, self.peek.literal),
            details: format!("want one of [{}]", kind_list(want)),
        });
    }

    pub(super) fn err_underlying(&mut self, summary: String, details: String) {
        self.detect_error(ParseError { token: self.cur.clone(), summary, details });
    }

    pub(super) fn err_cannot_be_annotated(&mut self) {
        self.detect_error(ParseError {
            token: self.cur.clone(),
            summary: format!("{} cannot be annotated", self.cur.kind),
            details: String::new(),
        });
    }

    pub(super) fn err_statement_misplaced(&mut self, pos: StatementPosition) {
        let summary = match self.cur.kind {
            TokenKind::Return => "return must be inside function".to_owned(),
            TokenKind::Import => "imports must be global".to_owned(),
            TokenKind::Extern => "extern must be global".to_owned(),
            TokenKind::Module => "module may only appear first".to_owned(),
            kind => format!("statement {kind} misplaced"),
        };

        let details = match pos {
            StatementPosition::Initial => "not allowed as first global statement",
            StatementPosition::Global => {
                if self.cur.kind == TokenKind::Module {
                    "another statement precedes it"
                } else {
                    "not allowed as global statement"
                }
            }
            StatementPosition::Enum => "not allowed inside enum",
            StatementPosition::Data => "not allowed as part of data",
            StatementPosition::Extern => "not allowed as part of extern",
            StatementPosition::Func => "not allowed inside function",
            StatementPosition::For => "not allowed in for loop",
            StatementPosition::Switch => "not allowed in switch statement",
        };

        self.detect_error(ParseError { token: self.cur.clone(), summary, details: details.to_owned() });
    }
}
