//! Built-in primitive types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive types understood by the IDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    Byte,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// 64-bit floating point number
    Double,
    /// UTF-8 text
    String,
    /// Opaque bytes
    Binary,
}

impl PrimitiveType {
    /// Returns the keyword used for this type in IDL source.
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Byte => "byte",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::Double => "double",
            PrimitiveType::String => "string",
            PrimitiveType::Binary => "binary",
        }
    }

    /// Whether this is one of the integer widths.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte | PrimitiveType::I16 | PrimitiveType::I32 | PrimitiveType::I64
        )
    }

    /// Inclusive value range for integer widths, `None` otherwise.
    pub fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            PrimitiveType::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            PrimitiveType::I16 => Some((i16::MIN as i64, i16::MAX as i64)),
            PrimitiveType::I32 => Some((i32::MIN as i64, i32::MAX as i64)),
            PrimitiveType::I64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_ranges() {
        assert_eq!(PrimitiveType::Byte.integer_range(), Some((-128, 127)));
        assert_eq!(PrimitiveType::I16.integer_range(), Some((-32768, 32767)));
        assert_eq!(PrimitiveType::Double.integer_range(), None);
        assert!(PrimitiveType::I64.is_integer());
        assert!(!PrimitiveType::Binary.is_integer());
    }
}
