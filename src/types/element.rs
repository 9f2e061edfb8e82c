use super::edge::Edge;
use super::element_id::ElementId;
use super::vertex::Vertex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of graph element
///
/// Each kind owns a one-byte prefix that partitions the row keyspace, so
/// that all vertices (or all edges) form one contiguous key range.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl ElementKind {
    pub const ALL: [ElementKind; 2] = [ElementKind::Vertex, ElementKind::Edge];

    /// Row key prefix byte for this kind
    pub const fn prefix(self) -> u8 {
        match self {
            ElementKind::Vertex => b'V',
            ElementKind::Edge => b'E',
        }
    }

    /// Reverse of [`ElementKind::prefix`]
    pub fn from_prefix(byte: u8) -> Option<Self> {
        match byte {
            b'V' => Some(ElementKind::Vertex),
            b'E' => Some(ElementKind::Edge),
            _ => None,
        }
    }

    /// Property keys that may never be written on this kind
    pub fn reserved_keys(self) -> &'static [&'static str] {
        match self {
            ElementKind::Vertex => &["id"],
            ElementKind::Edge => &["id", "label"],
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => f.write_str("vertex"),
            ElementKind::Edge => f.write_str("edge"),
        }
    }
}

/// Edge direction relative to a vertex
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Out,
    In,
    Both,
}

impl Direction {
    pub fn includes_out(self) -> bool {
        matches!(self, Direction::Out | Direction::Both)
    }

    pub fn includes_in(self) -> bool {
        matches!(self, Direction::In | Direction::Both)
    }
}

/// Common surface of vertices and edges
///
/// Element handles carry identity only. Property state always lives in
/// the store and is read through the owning graph.
pub trait Element {
    fn id(&self) -> &ElementId;

    fn kind(&self) -> ElementKind;
}

/// A vertex or an edge, as returned by kind-agnostic lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphElement {
    Vertex(Vertex),
    Edge(Edge),
}

impl GraphElement {
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            GraphElement::Vertex(v) => Some(v),
            GraphElement::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            GraphElement::Edge(e) => Some(e),
            GraphElement::Vertex(_) => None,
        }
    }
}

impl Element for GraphElement {
    fn id(&self) -> &ElementId {
        match self {
            GraphElement::Vertex(v) => v.id(),
            GraphElement::Edge(e) => e.id(),
        }
    }

    fn kind(&self) -> ElementKind {
        match self {
            GraphElement::Vertex(_) => ElementKind::Vertex,
            GraphElement::Edge(_) => ElementKind::Edge,
        }
    }
}

impl From<Vertex> for GraphElement {
    fn from(v: Vertex) -> Self {
        GraphElement::Vertex(v)
    }
}

impl From<Edge> for GraphElement {
    fn from(e: Edge) -> Self {
        GraphElement::Edge(e)
    }
}
