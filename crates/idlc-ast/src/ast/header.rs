//! Document headers.

use crate::foundation::Span;
use serde::{Deserialize, Serialize};

/// A header declaration preceding the definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Header {
    /// `include "path"`
    Include(Include),
    /// `namespace <scope> <name>`
    Namespace(Namespace),
}

impl Header {
    /// Source location of the header.
    pub fn span(&self) -> Span {
        match self {
            Header::Include(i) => i.span,
            Header::Namespace(n) => n.span,
        }
    }
}

/// Inclusion of another IDL document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    /// Path as written in the source
    pub path: String,
    #[serde(default)]
    pub span: Span,
}

impl Include {
    pub fn new(path: impl Into<String>, span: Span) -> Self {
        Self {
            path: path.into(),
            span,
        }
    }
}

/// Target-language namespace declaration. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Language scope (`py`, `java`, `*`, ...)
    pub scope: String,
    /// Namespace name in that language
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

impl Namespace {
    pub fn new(scope: impl Into<String>, name: impl Into<String>, span: Span) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
            span,
        }
    }
}

impl From<Include> for Header {
    fn from(include: Include) -> Self {
        Header::Include(include)
    }
}

impl From<Namespace> for Header {
    fn from(namespace: Namespace) -> Self {
        Header::Namespace(namespace)
    }
}
