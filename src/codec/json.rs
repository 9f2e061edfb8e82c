//! JSON value codec
//!
//! Stores values as serde JSON of the tagged `Value` enum. Larger than the
//! binary codec but readable with ordinary tools when inspecting a table.

use super::{CodecResult, ValueCodec};
use crate::types::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_codec_roundtrip() {
        let codec = JsonCodec;
        let value = Value::List(vec![Value::Bytes(vec![1, 2]), Value::from("x")]);
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_json_codec_is_readable() {
        let bytes = JsonCodec.encode(&Value::Int(5)).unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), r#"{"Int":5}"#);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        assert!(JsonCodec.decode(b"not json").is_err());
    }
}
