//! Runtime values of compiled types.
//!
//! Constants are evaluated to [`Value`]s during linking, field defaults are
//! stored as [`Value`]s, and the serialization entry points of a compiled
//! unit consume and produce them.
//!
//! Values of user-defined types carry the name of their type, so a value is
//! self-describing enough to pick its type descriptor from the scope.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value of some compiled type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Enum(EnumValue),
    /// Instance of a struct, union or exception
    Struct(StructValue),
}

/// Value of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValue {
    pub type_name: String,
    pub value: i32,
}

/// Instance of a struct, union or exception.
///
/// Fields are kept in insertion order; absent optional fields are simply
/// missing from the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructValue {
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

impl Value {
    /// Short description of the value's shape, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Enum(_) => "enum value",
            Value::Struct(_) => "struct value",
        }
    }

    /// Integer payload of any integer-like value.
    ///
    /// Enum values count as integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::I16(v) => Some(*v as i64),
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            Value::Enum(e) => Some(e.value as i64),
            _ => None,
        }
    }

    pub fn enum_value(type_name: impl Into<String>, value: i32) -> Self {
        Value::Enum(EnumValue {
            type_name: type_name.into(),
            value,
        })
    }
}

impl StructValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Value::Struct(value)
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Value::List(items) | Value::Set(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Enum(e) => write!(f, "{}({})", e.type_name, e.value),
            Value::Struct(s) => {
                write!(f, "{} {{", s.type_name)?;
                for (i, (name, value)) in s.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {name}: {value}")?;
                }
                write!(f, " }}")
            }
        }
    }
}
