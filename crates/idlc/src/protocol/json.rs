use super::{expect_type, Protocol, ProtocolError};
use crate::wire::{TType, WireValue};

/// JSON encoding via `serde_json`. Readable, mostly useful for debugging.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProtocol;

impl Protocol for JsonProtocol {
    fn name(&self) -> &'static str {
        "json"
    }

    fn serialize(&self, value: &WireValue) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize(&self, ty: TType, bytes: &[u8]) -> Result<WireValue, ProtocolError> {
        let value: WireValue = serde_json::from_slice(bytes)?;
        expect_type(ty, value)
    }
}
