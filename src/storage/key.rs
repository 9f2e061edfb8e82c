//! Structured store keys
//!
//! A record key is the tuple (row, family, qualifier). It is flattened with
//! the order-preserving component encoding, so records of one row, and of
//! one row+family, are contiguous prefix ranges.

use super::error::{StorageError, StorageResult};
use super::KeyRange;
use crate::codec::component::{decode_components, encode_component};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    pub row: Vec<u8>,
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
}

impl Key {
    pub fn new(
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
        }
    }

    /// Flatten to store bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(self.row.len() + self.family.len() + self.qualifier.len() + 6);
        encode_component(&mut buf, &self.row);
        encode_component(&mut buf, &self.family);
        encode_component(&mut buf, &self.qualifier);
        buf
    }

    pub fn decode(bytes: &[u8]) -> StorageResult<Self> {
        let mut parts = decode_components(bytes, 3)
            .map_err(|e| StorageError::Corrupt(format!("bad record key: {}", e)))?
            .into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(row), Some(family), Some(qualifier)) => Ok(Self {
                row,
                family,
                qualifier,
            }),
            _ => Err(StorageError::Corrupt("record key has missing components".into())),
        }
    }

    /// Encoded prefix shared by every key of `row`
    pub fn row_prefix(row: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(row.len() + 2);
        encode_component(&mut buf, row);
        buf
    }

    /// Encoded prefix shared by every key of `row` in `family`
    pub fn column_prefix(row: &[u8], family: &[u8]) -> Vec<u8> {
        let mut buf = Self::row_prefix(row);
        encode_component(&mut buf, family);
        buf
    }

    /// All records of one row
    pub fn row_range(row: &[u8]) -> KeyRange {
        KeyRange::prefix(&Self::row_prefix(row))
    }

    /// All records of one row in one family
    pub fn column_range(row: &[u8], family: &[u8]) -> KeyRange {
        KeyRange::prefix(&Self::column_prefix(row, family))
    }

    /// Smallest encoded key of any row `>= row`
    pub fn row_lower_bound(row: &[u8]) -> Vec<u8> {
        let mut buf = Self::row_prefix(row);
        buf.truncate(buf.len() - 2);
        buf
    }

    /// Every row from the row `start` (inclusive) up to the row `end` (exclusive)
    ///
    /// Bounds are raw row bytes, so a bound that is a byte prefix of longer
    /// rows places the split in the encoded key space exactly where the tuple
    /// order puts it.
    pub fn rows_between(start: &[u8], end: &[u8]) -> KeyRange {
        KeyRange::new(Self::row_lower_bound(start), Some(Self::row_lower_bound(end)))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{}",
            String::from_utf8_lossy(&self.row),
            String::from_utf8_lossy(&self.family),
            String::from_utf8_lossy(&self.qualifier)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let key = Key::new(b"Va\x00b".to_vec(), b"p".to_vec(), b"name".to_vec());
        assert_eq!(Key::decode(&key.encode()).unwrap(), key);
    }

    #[test]
    fn test_key_order_matches_tuple_order() {
        let a = Key::new(b"Va".to_vec(), b"x".to_vec(), b"".to_vec());
        let b = Key::new(b"Va".to_vec(), b"p".to_vec(), b"zzz".to_vec());
        let c = Key::new(b"Vaa".to_vec(), b"".to_vec(), b"".to_vec());
        assert_eq!(a.cmp(&b), a.encode().cmp(&b.encode()));
        assert_eq!(b.cmp(&c), b.encode().cmp(&c.encode()));
        assert!(a.encode() < c.encode());
    }

    #[test]
    fn test_row_range_excludes_longer_rows() {
        let range = Key::row_range(b"Va");
        assert!(range.contains(&Key::new(b"Va".to_vec(), b"p".to_vec(), b"k".to_vec()).encode()));
        assert!(!range.contains(&Key::new(b"Vab".to_vec(), b"x".to_vec(), b"".to_vec()).encode()));
    }

    #[test]
    fn test_column_range() {
        let range = Key::column_range(b"Va", b"eo");
        assert!(range.contains(&Key::new(b"Va".to_vec(), b"eo".to_vec(), b"e1".to_vec()).encode()));
        assert!(!range.contains(&Key::new(b"Va".to_vec(), b"ei".to_vec(), b"e1".to_vec()).encode()));
        assert!(!range.contains(&Key::new(b"Va".to_vec(), b"x".to_vec(), b"".to_vec()).encode()));
    }

    #[test]
    fn test_rows_between() {
        let range = Key::rows_between(b"Vb", b"Vd");
        let key = |row: &[u8]| Key::new(row.to_vec(), b"x".to_vec(), b"".to_vec()).encode();
        assert!(!range.contains(&key(b"Va")));
        assert!(range.contains(&key(b"Vb")));
        assert!(range.contains(&key(b"Vc\x00")));
        assert!(range.contains(&key(b"Vcz")));
        assert!(!range.contains(&key(b"Vd")));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Key::decode(b"no terminator").is_err());
    }
}
