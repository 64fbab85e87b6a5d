//! Type and constant expressions.

use crate::foundation::{PrimitiveType, Span};
use serde::{Deserialize, Serialize};

/// Symbolic type reference as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedType {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

/// Type expression attached to typedefs, fields, parameters and return types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    /// Built-in primitive
    Primitive(PrimitiveType),
    /// `list<T>`
    List(Box<TypeExpr>),
    /// `set<T>`
    Set(Box<TypeExpr>),
    /// `map<K, V>`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// Reference to a typedef, enum, struct, union or exception
    Named(NamedType),
}

impl TypeExpr {
    /// Reference a user-defined type by name.
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        TypeExpr::Named(NamedType {
            name: name.into(),
            span,
        })
    }

    pub fn list(element: TypeExpr) -> Self {
        TypeExpr::List(Box::new(element))
    }

    pub fn set(element: TypeExpr) -> Self {
        TypeExpr::Set(Box::new(element))
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }
}

impl From<PrimitiveType> for TypeExpr {
    fn from(primitive: PrimitiveType) -> Self {
        TypeExpr::Primitive(primitive)
    }
}

/// Symbolic reference to a constant or an enum item (`NAME`, `Enum.ITEM`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

/// Constant value expression.
///
/// Used for `const` definitions and for default values of fields and
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstExpr {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// `[a, b, c]`
    List(Vec<ConstExpr>),
    /// `{k: v, ...}`
    Map(Vec<(ConstExpr, ConstExpr)>),
    /// Another constant or an enum item
    Reference(SymbolRef),
}

impl ConstExpr {
    /// Reference another constant or enum item by name.
    pub fn reference(name: impl Into<String>, span: Span) -> Self {
        ConstExpr::Reference(SymbolRef {
            name: name.into(),
            span,
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        ConstExpr::String(value.into())
    }
}
