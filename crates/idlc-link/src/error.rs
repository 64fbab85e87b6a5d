//! Compile-time errors and non-fatal diagnostics.
//!
//! Every failure in generation or linking is reported as exactly one
//! [`CompileError`]. Each variant names the offending symbol and echoes the
//! [`Span`] supplied by the parser.
//!
//! # Examples
//!
//! ```
//! # use idlc_link::error::*;
//! # use idlc_ast::Span;
//! let error = CompileError::CircularDefinition {
//!     name: "X".to_string(),
//!     chain: vec!["X".into(), "Y".into(), "X".into()],
//!     span: Span::new(1, 1),
//! };
//! assert_eq!(error.kind(), ErrorKind::CircularDefinition);
//! assert!(error.to_string().contains("X -> Y -> X"));
//! ```

use idlc_ast::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for generation and linking.
pub type Result<T> = std::result::Result<T, CompileError>;

/// A fatal compilation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Two definitions (or two members of one definition) share a name.
    #[error("duplicate definition of '{name}' at {span} (first defined at {first})")]
    DuplicateSymbol {
        name: String,
        span: Span,
        first: Span,
    },

    /// The document uses a capability this compiler does not provide.
    #[error(
        "include of \"{path}\" found at {span}: including other IDL documents is not supported"
    )]
    UnsupportedFeature { path: String, span: Span },

    /// A reference names a symbol absent from the scope.
    #[error("unknown symbol '{name}' referenced by '{referrer}' at {span}")]
    UnknownSymbol {
        name: String,
        referrer: String,
        span: Span,
    },

    /// A value does not fit its declared type, or a reference resolved to
    /// the wrong kind of entity.
    #[error("type mismatch in '{name}' at {span}: {message}")]
    TypeMismatch {
        name: String,
        span: Span,
        message: String,
    },

    /// A constant, typedef or `extends` chain refers back to itself.
    #[error("circular definition of '{name}' at {span}: {}", format_chain(.chain))]
    CircularDefinition {
        name: String,
        chain: Vec<String>,
        span: Span,
    },

    /// A definition whose shape the parser should never have produced.
    #[error("invalid definition '{name}' at {span}: {message}")]
    InvalidDefinition {
        name: String,
        span: Span,
        message: String,
    },
}

/// Category of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DuplicateSymbol,
    UnsupportedFeature,
    UnknownSymbol,
    TypeMismatch,
    CircularDefinition,
    InvalidDefinition,
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::DuplicateSymbol { .. } => ErrorKind::DuplicateSymbol,
            CompileError::UnsupportedFeature { .. } => ErrorKind::UnsupportedFeature,
            CompileError::UnknownSymbol { .. } => ErrorKind::UnknownSymbol,
            CompileError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CompileError::CircularDefinition { .. } => ErrorKind::CircularDefinition,
            CompileError::InvalidDefinition { .. } => ErrorKind::InvalidDefinition,
        }
    }

    /// The symbol (or include path) the error is about.
    pub fn symbol(&self) -> &str {
        match self {
            CompileError::DuplicateSymbol { name, .. }
            | CompileError::UnknownSymbol { name, .. }
            | CompileError::TypeMismatch { name, .. }
            | CompileError::CircularDefinition { name, .. }
            | CompileError::InvalidDefinition { name, .. } => name,
            CompileError::UnsupportedFeature { path, .. } => path,
        }
    }

    /// Primary source location of the error.
    pub fn span(&self) -> Span {
        match self {
            CompileError::DuplicateSymbol { span, .. }
            | CompileError::UnsupportedFeature { span, .. }
            | CompileError::UnknownSymbol { span, .. }
            | CompileError::TypeMismatch { span, .. }
            | CompileError::CircularDefinition { span, .. }
            | CompileError::InvalidDefinition { span, .. } => *span,
        }
    }

    pub(crate) fn mismatch(name: &str, span: Span, message: impl Into<String>) -> Self {
        CompileError::TypeMismatch {
            name: name.to_string(),
            span,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(name: &str, span: Span, message: impl Into<String>) -> Self {
        CompileError::InvalidDefinition {
            name: name.to_string(),
            span,
            message: message.into(),
        }
    }
}

impl ErrorKind {
    /// Human-readable name of the category.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::DuplicateSymbol => "duplicate symbol",
            ErrorKind::UnsupportedFeature => "unsupported feature",
            ErrorKind::UnknownSymbol => "unknown symbol",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::CircularDefinition => "circular definition",
            ErrorKind::InvalidDefinition => "invalid definition",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn format_chain(chain: &[String]) -> String {
    chain.join(" -> ")
}

/// Non-fatal diagnostic produced while linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub message: String,
    pub span: Span,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning at {}: {}", self.span, self.message)
    }
}
