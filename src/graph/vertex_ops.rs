//! Vertex create / read / delete

use super::{resolve_id, Graph};
use crate::error::GraphResult;
use crate::layout::{self, family, Side};
use crate::storage::{ColumnFilter, Key, Mutation};
use crate::types::{Edge, ElementId, ElementKind, Vertex};
use std::collections::HashSet;
use tracing::debug;

impl Graph {
    /// Create a vertex
    ///
    /// # Arguments
    /// * `id` - Caller-chosen id, or `None` to generate one
    ///
    /// # Returns
    /// * `Err(GraphError::InvalidArgument)` for an empty id
    /// * `Err(GraphError::DuplicateId)` if a vertex or edge already uses the id
    pub fn add_vertex(&self, id: Option<&str>) -> GraphResult<Vertex> {
        let id = resolve_id(id)?;
        self.ensure_unused(&id)?;

        self.writer
            .add_mutation(Mutation::put(layout::vertex_exists_key(&id).encode(), Vec::new()))?;
        debug!(vertex = %id, "added vertex");
        Ok(Vertex::new(id))
    }

    /// Look up a vertex; `Ok(None)` if it does not exist
    pub fn get_vertex(&self, id: &str) -> GraphResult<Option<Vertex>> {
        let id = ElementId::new(id)?;
        if self.exists(ElementKind::Vertex, &id)? {
            Ok(Some(Vertex::new(id)))
        } else {
            Ok(None)
        }
    }

    /// Remove a vertex together with every incident edge
    ///
    /// Incident edges are removed first, one at a time, then every record of
    /// the vertex row. There is no rollback: a storage error partway through
    /// leaves the removals already applied.
    pub fn remove_vertex(&self, vertex: &Vertex) -> GraphResult<()> {
        self.add_or_remove_from_index(vertex, false)?;

        let incident = self.incident_edges(vertex.id())?;
        for edge in &incident {
            self.remove_edge(edge)?;
        }

        let removed = self.delete_row(ElementKind::Vertex, vertex.id())?;
        debug!(vertex = %vertex.id(), edges = incident.len(), records = removed, "removed vertex");
        Ok(())
    }

    /// Incident edges in both directions, each edge once
    fn incident_edges(&self, vertex: &ElementId) -> GraphResult<Vec<Edge>> {
        let row = layout::encode_element_key(ElementKind::Vertex, vertex);
        let scanner = self
            .reader()?
            .scan(Key::row_range(&row))
            .with_filter(ColumnFilter::family(family::OUT_EDGE))
            .with_filter(ColumnFilter::family(family::IN_EDGE));

        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for entry in scanner {
            let entry = entry?;
            let edge_id = layout::decode_id(&entry.key.qualifier)?;
            if !seen.insert(edge_id.clone()) {
                continue;
            }
            let (label, other) = layout::decode_adjacency_value(&entry.value)?;
            let edge = if entry.key.family == Side::Out.edge_family() {
                Edge::new(edge_id, label, vertex.clone(), other)
            } else {
                Edge::new(edge_id, label, other, vertex.clone())
            };
            edges.push(edge);
        }
        Ok(edges)
    }

    /// Delete every record of one element row
    pub(super) fn delete_row(&self, kind: ElementKind, id: &ElementId) -> GraphResult<usize> {
        let scanner = self.reader()?.scan(layout::element_row_range(kind, id));
        let mut deletes = Vec::new();
        for entry in scanner {
            deletes.push(Mutation::delete(entry?.key.encode()));
        }
        let count = deletes.len();
        self.writer.add_mutations(deletes)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_support::memory_graph;
    use crate::types::Direction;
    use crate::GraphError;

    #[test]
    fn test_add_get_remove_vertex() {
        let graph = memory_graph();
        let v = graph.add_vertex(Some("alice")).unwrap();
        assert_eq!(v.id().as_str(), "alice");
        assert_eq!(graph.get_vertex("alice").unwrap(), Some(v.clone()));

        graph.remove_vertex(&v).unwrap();
        assert_eq!(graph.get_vertex("alice").unwrap(), None);
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let graph = memory_graph();
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(graph.get_vertex(a.id().as_str()).unwrap().is_some());
    }

    #[test]
    fn test_duplicate_and_invalid_ids() {
        let graph = memory_graph();
        graph.add_vertex(Some("a")).unwrap();
        assert!(matches!(
            graph.add_vertex(Some("a")),
            Err(GraphError::DuplicateId(_))
        ));
        assert!(matches!(
            graph.add_vertex(Some("")),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(matches!(
            graph.get_vertex(""),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_vertex_id_cannot_reuse_edge_id() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        graph.add_edge(Some("shared"), &a, &a, "self").unwrap();
        assert!(matches!(
            graph.add_vertex(Some("shared")),
            Err(GraphError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_remove_vertex_cascades_to_edges() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        let c = graph.add_vertex(Some("c")).unwrap();
        graph.add_edge(Some("ab"), &a, &b, "x").unwrap();
        graph.add_edge(Some("cb"), &c, &b, "y").unwrap();
        graph.add_edge(Some("bb"), &b, &b, "loop").unwrap();
        graph.set_property(&b, "name", "bee").unwrap();

        graph.remove_vertex(&b).unwrap();

        assert_eq!(graph.edges().unwrap().count(), 0);
        assert_eq!(graph.adjacent_edges(&a, Direction::Both, &[]).unwrap().count(), 0);
        assert_eq!(graph.adjacent_edges(&c, Direction::Both, &[]).unwrap().count(), 0);
        assert!(graph.property_keys(&b).unwrap().is_empty());
        assert_eq!(graph.vertices().unwrap().count(), 2);
    }

    #[test]
    fn test_remove_missing_vertex_is_harmless() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        graph.remove_vertex(&a).unwrap();
        graph.remove_vertex(&a).unwrap();
        assert!(graph.get_vertex("a").unwrap().is_none());
    }
}
