use crate::error::GraphResult;
use crate::layout::{self, Side};
use crate::storage::{ColumnFilter, Key, ScanContext, Scanner};
use crate::types::{Direction, Edge, ElementId, ElementKind};
use std::collections::HashSet;

/// Lazy scan of a vertex's adjacency records
///
/// Each record carries the edge label and far endpoint, so edges are built
/// without touching the edge rows. Records with a non-matching label are
/// skipped before anything else is decoded.
pub struct AdjacentEdges {
    vertex: ElementId,
    labels: HashSet<String>,
    scanner: Scanner,
}

impl AdjacentEdges {
    pub(crate) fn new(
        reader: ScanContext,
        vertex: ElementId,
        direction: Direction,
        labels: HashSet<String>,
    ) -> Self {
        let row = layout::encode_element_key(ElementKind::Vertex, &vertex);
        let scanner = match Side::for_direction(direction) {
            [side] => reader.scan(Key::column_range(&row, side.edge_family())),
            sides => reader
                .scan(Key::row_range(&row))
                .with_filters(sides.iter().map(|s| ColumnFilter::family(s.edge_family()))),
        };
        Self {
            vertex,
            labels,
            scanner,
        }
    }
}

impl Iterator for AdjacentEdges {
    type Item = GraphResult<Edge>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.scanner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };
            let (label, other) = match layout::decode_adjacency_value(&entry.value) {
                Ok(decoded) => decoded,
                Err(e) => return Some(Err(e.into())),
            };
            if !self.labels.is_empty() && !self.labels.contains(&label) {
                continue;
            }
            let edge_id = match layout::decode_id(&entry.key.qualifier) {
                Ok(id) => id,
                Err(e) => return Some(Err(e.into())),
            };
            let edge = if entry.key.family == Side::Out.edge_family() {
                Edge::new(edge_id, label, self.vertex.clone(), other)
            } else {
                Edge::new(edge_id, label, other, self.vertex.clone())
            };
            return Some(Ok(edge));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_support::memory_graph;
    use crate::types::Direction;

    fn edge_ids(graph: &crate::Graph, v: &crate::Vertex, direction: Direction, labels: &[&str]) -> Vec<String> {
        graph
            .adjacent_edges(v, direction, labels)
            .unwrap()
            .map(|e| e.unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn test_adjacent_edges_by_direction_and_label() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        let c = graph.add_vertex(Some("c")).unwrap();
        graph.add_edge(Some("e1"), &a, &b, "knows").unwrap();
        graph.add_edge(Some("e2"), &a, &c, "likes").unwrap();
        graph.add_edge(Some("e3"), &c, &a, "knows").unwrap();

        assert_eq!(edge_ids(&graph, &a, Direction::Out, &[]), vec!["e1", "e2"]);
        assert_eq!(edge_ids(&graph, &a, Direction::In, &[]), vec!["e3"]);
        assert_eq!(edge_ids(&graph, &a, Direction::Both, &[]).len(), 3);
        assert_eq!(edge_ids(&graph, &a, Direction::Out, &["knows"]), vec!["e1"]);
        assert_eq!(edge_ids(&graph, &a, Direction::Both, &["knows", "likes"]).len(), 3);
        assert!(edge_ids(&graph, &a, Direction::Both, &["hates"]).is_empty());
    }

    #[test]
    fn test_adjacent_edges_carry_endpoints() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        let e = graph.add_edge(Some("e1"), &a, &b, "knows").unwrap();

        let from_out: Vec<_> = graph
            .adjacent_edges(&a, Direction::Out, &[])
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        let from_in: Vec<_> = graph
            .adjacent_edges(&b, Direction::In, &[])
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(from_out, vec![e.clone()]);
        assert_eq!(from_in, vec![e]);
    }

    #[test]
    fn test_self_loop_seen_from_both_sides() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        graph.add_edge(Some("loop"), &a, &a, "self").unwrap();
        assert_eq!(edge_ids(&graph, &a, Direction::Both, &[]), vec!["loop", "loop"]);
        assert_eq!(edge_ids(&graph, &a, Direction::Out, &[]), vec!["loop"]);
    }
}
