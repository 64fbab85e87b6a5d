// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Document model for the idlc interface definition compiler
//!
//! This crate contains the syntax tree handed to the compiler by an external
//! parser: headers, definitions, type and constant expressions, and the
//! source spans attached to each of them. It performs no validation; all
//! semantic checks happen in `idlc-link`.

pub mod ast;
pub mod foundation;

// Re-export commonly used types
pub use foundation::{PrimitiveType, Span};

pub use ast::*;
