//! Compact tagged binary codec for property values
//!
//! Each value is a 1-byte type tag followed by its payload:
//!
//! - `Bool`: `0x01` + `0x00`/`0x01`
//! - `Int`: `0x02` + 8 bytes big-endian i64
//! - `Float`: `0x03` + 8 bytes big-endian IEEE 754 bits
//! - `String`: `0x04` + u32 length + UTF-8 bytes
//! - `Bytes`: `0x05` + u32 length + raw bytes
//! - `List`: `0x06` + u32 count + encoded values
//! - `Map`: `0x07` + u32 count + (u32 key length, key, encoded value) pairs

use super::{CodecError, CodecResult, ValueCodec};
use crate::types::Value;
use std::collections::BTreeMap;

mod tags {
    pub const BOOL: u8 = 0x01;
    pub const INT: u8 = 0x02;
    pub const FLOAT: u8 = 0x03;
    pub const STRING: u8 = 0x04;
    pub const BYTES: u8 = 0x05;
    pub const LIST: u8 = 0x06;
    pub const MAP: u8 = 0x07;
}

/// Default value codec
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl ValueCodec for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        encode_to(value, &mut buf)?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        let mut reader = Reader { input: bytes, pos: 0 };
        let value = reader.value()?;
        if reader.pos != bytes.len() {
            return Err(CodecError::Decoding(format!(
                "{} trailing bytes after value",
                bytes.len() - reader.pos
            )));
        }
        Ok(value)
    }
}

fn encode_len(len: usize, what: &str, buf: &mut Vec<u8>) -> CodecResult<()> {
    let len = u32::try_from(len).map_err(|_| CodecError::Encoding(format!("{} too long", what)))?;
    buf.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

fn encode_to(value: &Value, buf: &mut Vec<u8>) -> CodecResult<()> {
    match value {
        Value::Bool(b) => {
            buf.push(tags::BOOL);
            buf.push(u8::from(*b));
        }
        Value::Int(i) => {
            buf.push(tags::INT);
            buf.extend_from_slice(&i.to_be_bytes());
        }
        Value::Float(f) => {
            buf.push(tags::FLOAT);
            buf.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        Value::String(s) => {
            buf.push(tags::STRING);
            encode_len(s.len(), "string", buf)?;
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            buf.push(tags::BYTES);
            encode_len(b.len(), "bytes", buf)?;
            buf.extend_from_slice(b);
        }
        Value::List(items) => {
            buf.push(tags::LIST);
            encode_len(items.len(), "list", buf)?;
            for item in items {
                encode_to(item, buf)?;
            }
        }
        Value::Map(map) => {
            buf.push(tags::MAP);
            encode_len(map.len(), "map", buf)?;
            for (key, item) in map {
                encode_len(key.len(), "map key", buf)?;
                buf.extend_from_slice(key.as_bytes());
                encode_to(item, buf)?;
            }
        }
    }
    Ok(())
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| {
                CodecError::Decoding(format!("unexpected end of input at offset {}", self.pos))
            })?;
        let slice = &self.input[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u64(&mut self) -> CodecResult<u64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(raw))
    }

    fn len(&mut self) -> CodecResult<usize> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(raw) as usize)
    }

    fn string(&mut self) -> CodecResult<String> {
        let len = self.len()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::Decoding(format!("invalid UTF-8: {}", e)))
    }

    fn value(&mut self) -> CodecResult<Value> {
        match self.u8()? {
            tags::BOOL => match self.u8()? {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                other => Err(CodecError::Decoding(format!("invalid bool byte {}", other))),
            },
            tags::INT => Ok(Value::Int(self.u64()? as i64)),
            tags::FLOAT => Ok(Value::Float(f64::from_bits(self.u64()?))),
            tags::STRING => Ok(Value::String(self.string()?)),
            tags::BYTES => {
                let len = self.len()?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            tags::LIST => {
                let count = self.len()?;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.value()?);
                }
                Ok(Value::List(items))
            }
            tags::MAP => {
                let count = self.len()?;
                let mut map = BTreeMap::new();
                for _ in 0..count {
                    let key = self.string()?;
                    let item = self.value()?;
                    map.insert(key, item);
                }
                Ok(Value::Map(map))
            }
            tag => Err(CodecError::Decoding(format!("unknown value tag 0x{:02x}", tag))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: Value) {
        let codec = BinaryCodec;
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_roundtrip_nested_value() {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from("Alice"));
        map.insert("raw".to_string(), Value::Bytes(vec![0, 1, 255]));
        map.insert(
            "scores".to_string(),
            Value::List(vec![Value::Int(-3), Value::Float(2.5), Value::Bool(true)]),
        );
        roundtrip(Value::Map(map));
    }

    #[test]
    fn test_int_and_float_are_distinct() {
        let codec = BinaryCodec;
        let int = codec.encode(&Value::Int(1)).unwrap();
        let float = codec.encode(&Value::Float(1.0)).unwrap();
        assert_ne!(int, float);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let codec = BinaryCodec;
        let mut a = BTreeMap::new();
        a.insert("x".to_string(), Value::Int(1));
        a.insert("y".to_string(), Value::Int(2));
        let mut b = BTreeMap::new();
        b.insert("y".to_string(), Value::Int(2));
        b.insert("x".to_string(), Value::Int(1));
        assert_eq!(
            codec.encode(&Value::Map(a)).unwrap(),
            codec.encode(&Value::Map(b)).unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_truncated_and_trailing() {
        let codec = BinaryCodec;
        let bytes = codec.encode(&Value::from("hello")).unwrap();
        assert!(codec.decode(&bytes[..bytes.len() - 1]).is_err());

        let mut extra = bytes.clone();
        extra.push(0);
        assert!(codec.decode(&extra).is_err());

        assert!(codec.decode(&[0x7F]).is_err());
        assert!(codec.decode(&[]).is_err());
    }

    #[test]
    fn test_huge_declared_length_does_not_panic() {
        let codec = BinaryCodec;
        let bytes = [tags::LIST, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(codec.decode(&bytes).is_err());
    }
}
