// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Symbol resolution and linking for the idlc compiler
//!
//! Turns a flat, possibly out-of-order list of definitions into a fully
//! resolved entity graph held by a [`Scope`].
//!
//! ```text
//! Document ──► Generator ──► Scope (unresolved) ──► link::link_all ──► Scope (resolved)
//!                                                    constants → types → services
//! ```
//!
//! Every cross-entity reference is an [`EntityId`] handle into the scope's
//! arena, so recursive and mutually recursive types are representable
//! without embedding one entity inside another.

pub mod entity;
pub mod error;
pub mod generate;
pub mod link;
pub mod pipeline;
pub mod scope;
pub mod value;

pub use entity::{
    AliasSpec, ConstSpec, ConstTarget, ConstValue, Entity, EntityId, EntityKind, EntityTag,
    EnumItemSpec, EnumSpec, FieldSpec, FunctionSpec, MethodRef, Reference, ServiceSpec,
    StructSpec, TypeSpec,
};
pub use error::{CompileError, ErrorKind, Result, Warning};
pub use generate::Generator;
pub use pipeline::{compile, Linked};
pub use scope::{Dealiased, Scope};
pub use value::{EnumValue, StructValue, Value};
