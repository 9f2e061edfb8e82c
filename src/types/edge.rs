use super::element::{Direction, Element, ElementKind};
use super::element_id::ElementId;
use super::vertex::Vertex;
use crate::error::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge handle
///
/// Represents a directed, labelled edge:
/// - Unique identifier
/// - Label (immutable, not a property)
/// - Out vertex (tail) and in vertex (head)
///
/// Self-loops, where both endpoints are the same vertex, are permitted.
/// The label and endpoints never change after creation, so the handle keeps
/// them; properties are always read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    id: ElementId,
    label: String,
    out_vertex: ElementId,
    in_vertex: ElementId,
}

impl Edge {
    pub fn new(
        id: ElementId,
        label: impl Into<String>,
        out_vertex: ElementId,
        in_vertex: ElementId,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            out_vertex,
            in_vertex,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn out_vertex_id(&self) -> &ElementId {
        &self.out_vertex
    }

    pub fn in_vertex_id(&self) -> &ElementId {
        &self.in_vertex
    }

    /// Endpoint vertex in the given direction
    ///
    /// # Errors
    /// * `GraphError::InvalidArgument` for `Direction::Both`
    pub fn vertex(&self, direction: Direction) -> GraphResult<Vertex> {
        match direction {
            Direction::Out => Ok(Vertex::new(self.out_vertex.clone())),
            Direction::In => Ok(Vertex::new(self.in_vertex.clone())),
            Direction::Both => Err(GraphError::InvalidArgument(
                "an edge endpoint must be requested as OUT or IN".into(),
            )),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.out_vertex == self.in_vertex
    }
}

impl Element for Edge {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[E:{} {}-{}->{}]",
            self.id, self.out_vertex, self.label, self.in_vertex
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ElementId {
        ElementId::new(s).unwrap()
    }

    #[test]
    fn test_edge_creation() {
        let edge = Edge::new(id("e1"), "knows", id("a"), id("b"));

        assert_eq!(edge.id(), &id("e1"));
        assert_eq!(edge.label(), "knows");
        assert_eq!(edge.vertex(Direction::Out).unwrap().id(), &id("a"));
        assert_eq!(edge.vertex(Direction::In).unwrap().id(), &id("b"));
        assert!(!edge.is_self_loop());
    }

    #[test]
    fn test_edge_vertex_both_is_invalid() {
        let edge = Edge::new(id("e1"), "knows", id("a"), id("b"));
        assert!(matches!(
            edge.vertex(Direction::Both),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_self_loop() {
        let edge = Edge::new(id("e1"), "likes", id("a"), id("a"));
        assert!(edge.is_self_loop());
        assert_eq!(edge.to_string(), "[E:e1 a-likes->a]");
    }
}
