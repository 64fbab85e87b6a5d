//! Error types of the compiler facade.

use crate::protocol::ProtocolError;
use idlc_link::CompileError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of [`Compiler::compile`](crate::Compiler::compile).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Invalid compiler configuration.
///
/// These never depend on the document being compiled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no serialization protocol configured")]
    MissingProtocol,

    #[error("unknown protocol '{0}', expected 'msgpack' or 'json'")]
    UnknownProtocol(String),

    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid compiler options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A value that does not fit its type, or bytes that do not decode to one.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },

    #[error("required field '{field}' of '{type_name}' is not set")]
    MissingField { type_name: String, field: String },

    #[error("'{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    #[error("{value} is not a value of enum '{type_name}'")]
    UnknownEnumValue { type_name: String, value: i32 },

    #[error("union '{type_name}' must have exactly one field set, found {count}")]
    UnionArity { type_name: String, count: usize },

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("cannot infer the type of {0}, use serialize_as")]
    CannotInfer(String),

    #[error(transparent)]
    Link(#[from] CompileError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ValueError {
    pub(crate) fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        ValueError::Mismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
