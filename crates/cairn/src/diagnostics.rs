//! Rendering of errors against their source text.
//!
//! Positions are stored as byte offsets; line and column are recomputed on
//! demand from a table of newline positions, so the hot paths never pay for
//! location bookkeeping.

use std::fmt::Write;

/// Line/column resolver for one source text.
///
/// Lines and columns are 1-based. Columns are byte columns; the sources this
/// crate lexes are ASCII-oriented, matching the lexer's byte model.
#[derive(Debug)]
pub struct LineIndex {
    /// Byte offset of each `\n` in the text.
    line_ends: Vec<usize>,
    len: usize,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let line_ends = text.bytes().enumerate().filter(|&(_, b)| b == b'\n').map(|(i, _)| i).collect();
        Self { line_ends, len: text.len() }
    }

    /// Resolves a byte offset to `(line, column)`, both 1-based.
    #[must_use]
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = self.line_ends.partition_point(|&end| end < offset);
        let line_start = if line == 0 { 0 } else { self.line_ends[line - 1] + 1 };
        (line + 1, offset - line_start + 1)
    }

    /// The full text of the line containing `offset`, without its newline.
    #[must_use]
    pub fn line_of<'t>(&self, text: &'t str, offset: usize) -> &'t str {
        let offset = offset.min(self.len);
        let line = self.line_ends.partition_point(|&end| end < offset);
        let start = if line == 0 { 0 } else { self.line_ends[line - 1] + 1 };
        let end = self.line_ends.get(line).copied().unwrap_or(self.len);
        &text[start..end]
    }
}

/// Renders one diagnostic in the canonical user-visible form:
///
/// ```text
/// uri:line:col: summary
///
///   offending line
///      ^
///   details
/// ```
#[must_use]
pub fn render(uri: &str, text: &str, offset: usize, summary: &str, details: &str) -> String {
    let index = LineIndex::new(text);
    let (line, col) = index.position(offset);
    let source_line = index.line_of(text, offset);

    let mut out = String::new();
    let _ = writeln!(out, "{uri}:{line}:{col}: {summary}");
    let _ = writeln!(out);
    let _ = writeln!(out, "  {source_line}");
    let _ = writeln!(out, "  {}^", " ".repeat(col.saturating_sub(1)));
    if !details.is_empty() {
        let _ = writeln!(out, "  {details}");
    }
    out
}
