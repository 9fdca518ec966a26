//! Source code representation shared by the lexer, parser, and error model.
//!
//! A [`Location`] is a cheap, `Arc`-shared handle into the original source
//! text plus a byte range. Every token and AST node carries one so that
//! diagnostics can always point back at the exact bytes that produced them,
//! without copying the source text itself. `Arc` (rather than `Rc`) is used
//! so that a parsed [`crate::syntax::Program`] is `Send + Sync` once built.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

pub mod pretty;

/// Where a piece of source code came from.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Source {
    /// The top-level file (or string) that was handed to the parser.
    Main {
        /// Name used in diagnostics, e.g. a file path or `"<input>"`.
        name: String,
    },
    /// A location created without real provenance, e.g. by a test helper
    /// that parses a bare `&str` via [`std::str::FromStr`].
    Unknown,
}

impl Source {
    /// A short label suitable for the `-->` line of a diagnostic.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Source::Main { name } => name,
            Source::Unknown => "<input>",
        }
    }
}

/// The full text of one source unit, along with a precomputed table of line
/// start offsets so that byte offsets can be converted to `{line, column}`
/// in `O(log n)`.
#[derive(Debug)]
pub struct Code {
    /// The complete source text, with a trailing newline appended if the
    /// original text did not end with one (per the External Interfaces
    /// contract: "a trailing newline is added internally if missing").
    pub value: String,
    /// Byte offset of the first character of each line; `line_starts[0]` is
    /// always `0`.
    line_starts: Vec<usize>,
    /// Where this code came from.
    pub source: Source,
}

impl Code {
    /// Builds a `Code` from source text, normalizing a missing trailing
    /// newline so line/column lookups stay well-defined at EOF.
    #[must_use]
    pub fn new(text: &str, source: Source) -> Self {
        let mut value = text.to_string();
        if !value.ends_with('\n') {
            value.push('\n');
        }
        let line_starts = compute_line_starts(&value);
        Code {
            value,
            line_starts,
            source,
        }
    }

    /// Converts a byte offset into a 1-based `(line, column)` pair.
    ///
    /// Column is counted in UTF-8 characters (not bytes) from the start of
    /// the line, 1-based.
    #[must_use]
    pub fn line_column(&self, offset: usize) -> (u32, u32) {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_index];
        let column = self.value[line_start..offset.min(self.value.len())]
            .chars()
            .count()
            + 1;
        (line_index as u32 + 1, column as u32)
    }

    /// Returns the text of the line containing `offset`, without its
    /// terminating newline.
    #[must_use]
    pub fn line_text(&self, offset: usize) -> &str {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.line_starts[line_index];
        let end = self
            .line_starts
            .get(line_index + 1)
            .copied()
            .unwrap_or(self.value.len());
        self.value[start..end].trim_end_matches('\n')
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// A byte span within a [`Code`], shared cheaply via `Arc`.
#[derive(Clone, Eq, PartialEq)]
pub struct Location {
    pub code: Arc<Code>,
    pub range: Range<usize>,
}

impl Location {
    /// Creates a location with no real source, for tests and `FromStr`
    /// convenience constructors.
    #[must_use]
    pub fn dummy() -> Self {
        Location {
            code: Arc::new(Code::new("", Source::Unknown)),
            range: 0..0,
        }
    }

    /// 1-based line number of the start of this location.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.code.line_column(self.range.start).0
    }

    /// 1-based column number of the start of this location.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.code.line_column(self.range.start).1
    }

    /// Byte offset of the start of this location.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.range.start
    }

    /// The source text covered by this location.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.code.value[self.range.clone()]
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("line", &self.line())
            .field("column", &self.column())
            .field("range", &self.range)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_tracks_newlines() {
        let code = Arc::new(Code::new("ab\ncd\nef", Source::Unknown));
        assert_eq!(code.line_column(0), (1, 1));
        assert_eq!(code.line_column(2), (1, 3));
        assert_eq!(code.line_column(3), (2, 1));
        assert_eq!(code.line_column(6), (3, 1));
    }

    #[test]
    fn missing_trailing_newline_is_added() {
        let code = Code::new("no newline", Source::Unknown);
        assert!(code.value.ends_with('\n'));
    }

    #[test]
    fn line_text_excludes_newline() {
        let code = Code::new("first\nsecond\n", Source::Unknown);
        assert_eq!(code.line_text(0), "first");
        assert_eq!(code.line_text(6), "second");
    }
}
