//! Source location tracking for error reporting.
//!
//! The external parser attaches a [`Span`] to every definition and every
//! symbolic reference. The compiler never computes spans itself; it echoes
//! them verbatim in diagnostics.
//!
//! # Examples
//!
//! ```
//! # use idlc_ast::Span;
//! let span = Span::new(12, 5);
//! assert_eq!(span.to_string(), "line 12, column 5");
//! assert!(!Span::unknown().is_known());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Line/column position of a node in the source document.
///
/// Both coordinates are 1-based. A span of `0:0` means the parser did not
/// supply a location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    #[serde(default)]
    pub column: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Create a span at the start of a line.
    pub fn line(line: u32) -> Self {
        Self::new(line, 1)
    }

    /// Span used when the parser supplied no location.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether this span points at a real source position.
    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "line {}, column {}", self.line, self.column)
        } else {
            write!(f, "<unknown location>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(3, 14).to_string(), "line 3, column 14");
        assert_eq!(Span::line(7).to_string(), "line 7, column 1");
        assert_eq!(Span::unknown().to_string(), "<unknown location>");
    }

    #[test]
    fn test_span_column_defaults_when_missing() {
        let span: Span = serde_json::from_str(r#"{"line": 9}"#).unwrap();
        assert_eq!(span, Span::new(9, 0));
        assert!(span.is_known());
    }
}
