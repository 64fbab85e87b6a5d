//! Foundation types shared by every layer of the compiler.

pub mod primitive;
pub mod span;

pub use primitive::PrimitiveType;
pub use span::Span;
