//! Protocol-level values.
//!
//! A [`WireValue`] is what a [`Protocol`](crate::protocol::Protocol)
//! actually encodes: field names are gone (struct fields are keyed by id),
//! enums are plain `i32`s, and containers carry the [`TType`] of their
//! elements so an empty container still knows what it holds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TType {
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
    Struct,
    Map,
    Set,
    List,
}

impl fmt::Display for TType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TType::Bool => "bool",
            TType::Byte => "byte",
            TType::I16 => "i16",
            TType::I32 => "i32",
            TType::I64 => "i64",
            TType::Double => "double",
            TType::String => "string",
            TType::Binary => "binary",
            TType::Struct => "struct",
            TType::Map => "map",
            TType::Set => "set",
            TType::List => "list",
        };
        f.write_str(name)
    }
}

/// One encoded struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub id: i16,
    pub value: WireValue,
}

/// A value as seen by a protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireValue {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    #[serde(with = "double")]
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Struct(Vec<FieldValue>),
    Map {
        key: TType,
        value: TType,
        entries: Vec<(WireValue, WireValue)>,
    },
    Set {
        element: TType,
        items: Vec<WireValue>,
    },
    List {
        element: TType,
        items: Vec<WireValue>,
    },
}

impl WireValue {
    pub fn ttype(&self) -> TType {
        match self {
            WireValue::Bool(_) => TType::Bool,
            WireValue::Byte(_) => TType::Byte,
            WireValue::I16(_) => TType::I16,
            WireValue::I32(_) => TType::I32,
            WireValue::I64(_) => TType::I64,
            WireValue::Double(_) => TType::Double,
            WireValue::String(_) => TType::String,
            WireValue::Binary(_) => TType::Binary,
            WireValue::Struct(_) => TType::Struct,
            WireValue::Map { .. } => TType::Map,
            WireValue::Set { .. } => TType::Set,
            WireValue::List { .. } => TType::List,
        }
    }

    /// Field `id` of a struct value.
    pub fn field(&self, id: i16) -> Option<&WireValue> {
        match self {
            WireValue::Struct(fields) => fields.iter().find(|f| f.id == id).map(|f| &f.value),
            _ => None,
        }
    }
}

/// Doubles for text formats, which have no literal for infinity or NaN.
///
/// Human-readable formats write non-finite values as `"inf"`, `"-inf"` and
/// `"nan"`. Binary formats keep the native float.
mod double {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Special(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() || !serializer.is_human_readable() {
            return serializer.serialize_f64(*value);
        }
        let text = if value.is_nan() {
            "nan"
        } else if value.is_sign_positive() {
            "inf"
        } else {
            "-inf"
        };
        serializer.serialize_str(text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        if !deserializer.is_human_readable() {
            return f64::deserialize(deserializer);
        }
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Special(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("'{other}' is not a double"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttype_of_containers() {
        let list = WireValue::List {
            element: TType::I32,
            items: vec![WireValue::I32(1)],
        };
        assert_eq!(list.ttype(), TType::List);
        assert_eq!(WireValue::Struct(vec![]).ttype(), TType::Struct);
    }

    #[test]
    fn test_field_lookup_by_id() {
        let value = WireValue::Struct(vec![
            FieldValue {
                id: 1,
                value: WireValue::Bool(true),
            },
            FieldValue {
                id: -1,
                value: WireValue::String("x".into()),
            },
        ]);
        assert_eq!(value.field(-1), Some(&WireValue::String("x".into())));
        assert_eq!(value.field(2), None);
        assert_eq!(WireValue::I32(3).field(1), None);
    }
}
