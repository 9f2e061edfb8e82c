//! Key layout of the graph and index tables
//!
//! Graph table, one row per element (`V<id>` or `E<id>`):
//!
//! | row      | family | qualifier     | value                       |
//! |----------|--------|---------------|-----------------------------|
//! | `V<id>`  | `x`    | (empty)       | (empty)                     |
//! | `V<id>`  | `eo`   | edge id       | (label, in vertex id)       |
//! | `V<id>`  | `ei`   | edge id       | (label, out vertex id)      |
//! | `E<id>`  | `x`    | label         | (empty)                     |
//! | `E<id>`  | `vo`   | out vertex id | (empty)                     |
//! | `E<id>`  | `vi`   | in vertex id  | (empty)                     |
//! | either   | `p`    | property key  | codec bytes                 |
//!
//! Index table:
//!
//! | row            | family        | qualifier | value   |
//! |----------------|---------------|-----------|---------|
//! | `V<key>`       | encoded value | owner id  | (empty) |
//! | `#V`           | indexed key   | (empty)   | (empty) |
//!
//! with `E` / `#E` for edges. Kind bytes make every kind a contiguous range;
//! `W` and `F` are the sentinel upper bounds.

use crate::codec::component::{decode_components, encode_components};
use crate::storage::{prefix_successor, Key, KeyRange, StorageError, StorageResult};
use crate::types::{Direction, ElementId, ElementKind};

/// Column families
pub mod family {
    pub const EXISTS: &[u8] = b"x";
    pub const OUT_EDGE: &[u8] = b"eo";
    pub const IN_EDGE: &[u8] = b"ei";
    pub const OUT_VERTEX: &[u8] = b"vo";
    pub const IN_VERTEX: &[u8] = b"vi";
    pub const PROPERTY: &[u8] = b"p";
}

const REGISTRY_MARKER: u8 = b'#';

/// One end of an edge
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    Out,
    In,
}

impl Side {
    /// Sides covered by a traversal direction
    pub fn for_direction(direction: Direction) -> &'static [Side] {
        match direction {
            Direction::Out => &[Side::Out],
            Direction::In => &[Side::In],
            Direction::Both => &[Side::Out, Side::In],
        }
    }

    /// Adjacency family on the vertex row
    pub fn edge_family(self) -> &'static [u8] {
        match self {
            Side::Out => family::OUT_EDGE,
            Side::In => family::IN_EDGE,
        }
    }

    /// Endpoint family on the edge row
    pub fn vertex_family(self) -> &'static [u8] {
        match self {
            Side::Out => family::OUT_VERTEX,
            Side::In => family::IN_VERTEX,
        }
    }
}

// ---------------------------------------------------------------------------
// Element rows
// ---------------------------------------------------------------------------

pub fn encode_element_key(kind: ElementKind, id: &ElementId) -> Vec<u8> {
    let mut row = Vec::with_capacity(id.as_bytes().len() + 1);
    row.push(kind.prefix());
    row.extend_from_slice(id.as_bytes());
    row
}

pub fn decode_element_key(row: &[u8]) -> StorageResult<(ElementKind, ElementId)> {
    let (&prefix, rest) = row
        .split_first()
        .ok_or_else(|| StorageError::Corrupt("empty element row".into()))?;
    let kind = ElementKind::from_prefix(prefix)
        .ok_or_else(|| StorageError::Corrupt(format!("unknown element kind byte 0x{:02x}", prefix)))?;
    let id = std::str::from_utf8(rest)
        .map_err(|e| StorageError::Corrupt(format!("element id is not UTF-8: {}", e)))?;
    let id = ElementId::new(id).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    Ok((kind, id))
}

/// Raw row bounds `(min, max_exclusive)` of one kind
pub fn range_for_kind(kind: ElementKind) -> (Vec<u8>, Vec<u8>) {
    (vec![kind.prefix()], vec![kind.prefix() + 1])
}

/// Store key range holding every record of every element of one kind
pub fn kind_scan_range(kind: ElementKind) -> KeyRange {
    let (min, max) = range_for_kind(kind);
    Key::rows_between(&min, &max)
}

/// Store key range over the rows with `min <= id <= max`
pub fn id_scan_range(kind: ElementKind, min: &ElementId, max: &ElementId) -> KeyRange {
    let start = Key::row_lower_bound(&encode_element_key(kind, min));
    let end = prefix_successor(&Key::row_prefix(&encode_element_key(kind, max)));
    KeyRange::new(start, end)
}

pub fn element_row_range(kind: ElementKind, id: &ElementId) -> KeyRange {
    Key::row_range(&encode_element_key(kind, id))
}

pub fn vertex_exists_key(id: &ElementId) -> Key {
    Key::new(
        encode_element_key(ElementKind::Vertex, id),
        family::EXISTS,
        Vec::new(),
    )
}

pub fn edge_exists_key(id: &ElementId, label: &str) -> Key {
    Key::new(
        encode_element_key(ElementKind::Edge, id),
        family::EXISTS,
        label.as_bytes(),
    )
}

/// Adjacency record of `edge` on the row of `vertex`
pub fn adjacency_key(vertex: &ElementId, side: Side, edge: &ElementId) -> Key {
    Key::new(
        encode_element_key(ElementKind::Vertex, vertex),
        side.edge_family(),
        edge.as_bytes(),
    )
}

/// Adjacency value: the edge label and the vertex at the far end
pub fn encode_adjacency_value(label: &str, other: &ElementId) -> Vec<u8> {
    encode_components(&[label.as_bytes(), other.as_bytes()])
}

pub fn decode_adjacency_value(value: &[u8]) -> StorageResult<(String, ElementId)> {
    let mut parts = decode_components(value, 2)
        .map_err(|e| StorageError::Corrupt(format!("bad adjacency value: {}", e)))?
        .into_iter();
    let label = parts.next().unwrap_or_default();
    let other = parts.next().unwrap_or_default();
    let label = String::from_utf8(label)
        .map_err(|e| StorageError::Corrupt(format!("edge label is not UTF-8: {}", e)))?;
    Ok((label, decode_id(&other)?))
}

/// Endpoint record of `edge` pointing at `vertex`
pub fn endpoint_key(edge: &ElementId, side: Side, vertex: &ElementId) -> Key {
    Key::new(
        encode_element_key(ElementKind::Edge, edge),
        side.vertex_family(),
        vertex.as_bytes(),
    )
}

pub fn property_key(kind: ElementKind, id: &ElementId, key: &str) -> Key {
    Key::new(encode_element_key(kind, id), family::PROPERTY, key.as_bytes())
}

/// Decode an id stored as a qualifier or value component
pub fn decode_id(bytes: &[u8]) -> StorageResult<ElementId> {
    let id = std::str::from_utf8(bytes)
        .map_err(|e| StorageError::Corrupt(format!("element id is not UTF-8: {}", e)))?;
    ElementId::new(id).map_err(|e| StorageError::Corrupt(e.to_string()))
}

pub fn decode_utf8(bytes: &[u8], what: &str) -> StorageResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| StorageError::Corrupt(format!("{} is not UTF-8: {}", what, e)))
}

// ---------------------------------------------------------------------------
// Index table
// ---------------------------------------------------------------------------

fn index_row(kind: ElementKind, property_key: &str) -> Vec<u8> {
    let mut row = Vec::with_capacity(property_key.len() + 1);
    row.push(kind.prefix());
    row.extend_from_slice(property_key.as_bytes());
    row
}

/// Index entry for `owner` holding `property_key = value`
///
/// `encoded_value` must come from the graph's value codec.
pub fn encode_index_key(
    kind: ElementKind,
    property_key: &str,
    encoded_value: &[u8],
    owner: &ElementId,
) -> Key {
    Key::new(index_row(kind, property_key), encoded_value, owner.as_bytes())
}

/// Every entry of one indexed key
pub fn index_key_range(kind: ElementKind, property_key: &str) -> KeyRange {
    Key::row_range(&index_row(kind, property_key))
}

/// Every entry of one indexed key with one value
pub fn index_value_range(kind: ElementKind, property_key: &str, encoded_value: &[u8]) -> KeyRange {
    Key::column_range(&index_row(kind, property_key), encoded_value)
}

/// Registry record marking `property_key` as indexed for `kind`
pub fn registry_key(kind: ElementKind, property_key: &str) -> Key {
    Key::new(registry_row(kind), property_key.as_bytes(), Vec::new())
}

pub fn registry_range(kind: ElementKind) -> KeyRange {
    Key::row_range(&registry_row(kind))
}

fn registry_row(kind: ElementKind) -> Vec<u8> {
    vec![REGISTRY_MARKER, kind.prefix()]
}
