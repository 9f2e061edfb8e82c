//! Order-preserving encoding of byte-string tuples
//!
//! Each component is written with `0x00` escaped as `0x00 0xFF` and closed by
//! the terminator `0x00 0x01`. Comparing two encoded tuples byte-wise gives
//! the same result as comparing the tuples component by component, and the
//! encoding of a tuple prefix is a byte prefix of every tuple extending it.

use super::{CodecError, CodecResult};

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

/// Append one escaped, terminated component to `buf`
pub fn encode_component(buf: &mut Vec<u8>, component: &[u8]) {
    buf.reserve(component.len() + 2);
    for &byte in component {
        if byte == ESCAPE {
            buf.push(ESCAPE);
            buf.push(ESCAPED_ZERO);
        } else {
            buf.push(byte);
        }
    }
    buf.push(ESCAPE);
    buf.push(TERMINATOR);
}

/// Encode a whole tuple
pub fn encode_components(components: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(components.iter().map(|c| c.len() + 2).sum());
    for component in components {
        encode_component(&mut buf, component);
    }
    buf
}

/// Decode one component from the front of `input`
///
/// Returns the component and the number of bytes consumed.
pub fn decode_component(input: &[u8]) -> CodecResult<(Vec<u8>, usize)> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        let byte = input[i];
        if byte != ESCAPE {
            out.push(byte);
            i += 1;
            continue;
        }
        match input.get(i + 1) {
            Some(&ESCAPED_ZERO) => {
                out.push(ESCAPE);
                i += 2;
            }
            Some(&TERMINATOR) => return Ok((out, i + 2)),
            Some(other) => {
                return Err(CodecError::Decoding(format!(
                    "invalid escape sequence 0x00 0x{:02x} at offset {}",
                    other, i
                )))
            }
            None => break,
        }
    }
    Err(CodecError::Decoding("unterminated key component".into()))
}

/// Decode exactly `count` components that make up all of `input`
pub fn decode_components(input: &[u8], count: usize) -> CodecResult<Vec<Vec<u8>>> {
    let mut parts = Vec::with_capacity(count);
    let mut offset = 0;
    for _ in 0..count {
        let (part, used) = decode_component(&input[offset..])?;
        parts.push(part);
        offset += used;
    }
    if offset != input.len() {
        return Err(CodecError::Decoding(format!(
            "{} trailing bytes after {} key components",
            input.len() - offset,
            count
        )));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_roundtrip_with_zero_bytes() {
        let raw: &[u8] = &[b'a', 0x00, 0xFF, 0x00, 0x01, b'z'];
        let mut buf = Vec::new();
        encode_component(&mut buf, raw);

        let (decoded, used) = decode_component(&buf).unwrap();
        assert_eq!(decoded, raw);
        assert_eq!(used, buf.len());
    }

    #[test]
    fn test_tuple_order_matches_component_order() {
        let tuples: Vec<[&[u8]; 2]> = vec![
            [&b"a"[..], &b"z"[..]],
            [&b"a\x00"[..], &b""[..]],
            [&b"a\x01"[..], &b""[..]],
            [&b"aa"[..], &b""[..]],
            [&b"b"[..], &b""[..]],
        ];
        let encoded: Vec<Vec<u8>> = tuples.iter().map(|t| encode_components(t)).collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should sort before {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_prefix_property() {
        let row_only = encode_components(&[&b"Vabc"[..]]);
        let full = encode_components(&[&b"Vabc"[..], &b"p"[..], &b"name"[..]]);
        assert!(full.starts_with(&row_only));

        let other_row = encode_components(&[&b"Vabcd"[..], &b"p"[..], &b"name"[..]]);
        assert!(!other_row.starts_with(&row_only));
    }

    #[test]
    fn test_decode_components_rejects_trailing_bytes() {
        let mut buf = encode_components(&[&b"row"[..], &b"fam"[..]]);
        buf.push(b'x');
        assert!(decode_components(&buf, 2).is_err());
    }

    #[test]
    fn test_decode_rejects_unterminated() {
        assert!(decode_component(b"abc").is_err());
        assert!(decode_component(&[b'a', 0x00]).is_err());
        assert!(decode_component(&[b'a', 0x00, 0x07]).is_err());
    }
}
