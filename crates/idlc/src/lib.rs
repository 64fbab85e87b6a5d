// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # idlc
//!
//! Compiler for interface definition documents.
//!
//! This crate is a facade over:
//! - `idlc-ast` - the document model produced by a parser
//! - `idlc-link` - scope, entities, and the three linker passes
//!
//! and adds the compiled unit: generated type and service descriptors
//! plus serialization through a pluggable [`Protocol`].
//!
//! ```text
//! Document ──► Generator ──► constants → types → services ──► CompiledUnit
//!                                                               │
//!                              Value ◄──► WireValue ◄──► Protocol (bytes)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use idlc::{Compiler, JsonProtocol};
//!
//! let unit = Compiler::new(JsonProtocol).compile("shapes", &document)?;
//! let point = unit.struct_type("Point").unwrap().construct([("x", Value::I32(1))])?;
//! let bytes = unit.serialize(&point)?;
//! ```

pub use idlc_ast as ast;
pub use idlc_link as link;
pub use idlc_link::{
    CompileError, EntityId, EntityTag, EnumValue, ErrorKind, Scope, StructValue, TypeSpec, Value,
    Warning,
};

pub mod codec;
pub mod compile;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod protocol;
pub mod unit;
pub mod wire;

pub use compile::{compile, Compiler};
pub use config::{CompilerOptions, ProtocolKind};
pub use descriptor::{
    EnumDescriptor, FunctionDescriptor, ServiceDescriptor, StructDescriptor, TypeDescriptor,
};
pub use error::{ConfigError, Error, ValueError};
pub use protocol::{JsonProtocol, MessagePackProtocol, Protocol, ProtocolError};
pub use unit::CompiledUnit;
pub use wire::{FieldValue, TType, WireValue};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
