//! Serialization protocols.
//!
//! The compiled unit never encodes bytes itself. It lowers values to
//! [`WireValue`]s and forwards them to whichever [`Protocol`] the compiler
//! was configured with.

mod json;
mod msgpack;

pub use json::JsonProtocol;
pub use msgpack::MessagePackProtocol;

use crate::wire::{TType, WireValue};
use std::fmt;
use thiserror::Error;

/// Errors raised by a protocol implementation.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("msgpack encoding failed: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),

    #[error("msgpack decoding failed: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),

    #[error("json codec failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a {expected} payload, found {found}")]
    UnexpectedType { expected: TType, found: TType },
}

/// An encoding strategy for wire values.
pub trait Protocol: fmt::Debug + Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    fn serialize(&self, value: &WireValue) -> Result<Vec<u8>, ProtocolError>;

    /// Decode `bytes`, which must hold a value of wire type `ty`.
    fn deserialize(&self, ty: TType, bytes: &[u8]) -> Result<WireValue, ProtocolError>;
}

/// Reject a decoded payload whose top-level tag is not `expected`.
pub(crate) fn expect_type(expected: TType, value: WireValue) -> Result<WireValue, ProtocolError> {
    let found = value.ttype();
    if found == expected {
        Ok(value)
    } else {
        Err(ProtocolError::UnexpectedType { expected, found })
    }
}
