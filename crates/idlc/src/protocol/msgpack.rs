use super::{expect_type, Protocol, ProtocolError};
use crate::wire::{TType, WireValue};

/// MessagePack encoding via `rmp-serde`, with named fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackProtocol;

impl Protocol for MessagePackProtocol {
    fn name(&self) -> &'static str {
        "msgpack"
    }

    fn serialize(&self, value: &WireValue) -> Result<Vec<u8>, ProtocolError> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    fn deserialize(&self, ty: TType, bytes: &[u8]) -> Result<WireValue, ProtocolError> {
        let value: WireValue = rmp_serde::from_slice(bytes)?;
        expect_type(ty, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FieldValue;

    #[test]
    fn test_round_trip_nested_value() {
        let value = WireValue::Struct(vec![
            FieldValue {
                id: 1,
                value: WireValue::Map {
                    key: TType::String,
                    value: TType::List,
                    entries: vec![(
                        WireValue::String("k".into()),
                        WireValue::List {
                            element: TType::Double,
                            items: vec![WireValue::Double(1.5)],
                        },
                    )],
                },
            },
            FieldValue {
                id: -1,
                value: WireValue::Binary(vec![0, 255]),
            },
        ]);

        let protocol = MessagePackProtocol;
        let bytes = protocol.serialize(&value).unwrap();
        assert_eq!(protocol.deserialize(TType::Struct, &bytes).unwrap(), value);
    }

    #[test]
    fn test_rejects_wrong_top_level_type() {
        let protocol = MessagePackProtocol;
        let bytes = protocol.serialize(&WireValue::I32(7)).unwrap();
        let err = protocol.deserialize(TType::String, &bytes).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedType {
                expected: TType::String,
                found: TType::I32
            }
        ));
    }

    #[test]
    fn test_garbage_input() {
        let err = MessagePackProtocol
            .deserialize(TType::I32, &[0xc1])
            .unwrap_err();
        assert!(matches!(err, ProtocolError::MsgpackDecode(_)));
    }
}
