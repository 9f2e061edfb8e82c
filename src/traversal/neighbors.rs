use super::adjacent::AdjacentEdges;
use crate::error::GraphResult;
use crate::layout::{self, family, Side};
use crate::storage::{ColumnFilter, ScanContext};
use crate::types::{Direction, ElementId, ElementKind, Vertex};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Endpoints of one edge, filled in as its records arrive
#[derive(Default)]
struct EndpointPair {
    out_vertex: Option<ElementId>,
    in_vertex: Option<ElementId>,
}

enum State {
    /// Nothing fetched yet
    Pending {
        reader: ScanContext,
        direction: Direction,
        labels: HashSet<String>,
    },
    Ready(VecDeque<Vertex>),
    Done,
}

/// Two-phase neighbor lookup
///
/// On the first pull, the origin's adjacency records are scanned to collect
/// the ids of matching edges. Then one batched scan fetches the endpoint
/// records of all those edges at once. The two records of an edge may arrive
/// in any order relative to each other and to other edges, so they are
/// paired by edge id before any result is produced.
///
/// Memory use is proportional to the origin's degree.
pub struct AdjacentVertices {
    origin: ElementId,
    state: State,
}

impl AdjacentVertices {
    pub(crate) fn new(
        reader: ScanContext,
        origin: ElementId,
        direction: Direction,
        labels: HashSet<String>,
    ) -> Self {
        Self {
            origin,
            state: State::Pending {
                reader,
                direction,
                labels,
            },
        }
    }

    fn resolve(
        &self,
        reader: ScanContext,
        direction: Direction,
        labels: HashSet<String>,
    ) -> GraphResult<VecDeque<Vertex>> {
        // Phase 1: edge ids, each once even when a self-loop shows up on both sides
        let mut seen = HashSet::new();
        let mut edge_ids = Vec::new();
        for edge in AdjacentEdges::new(reader.clone(), self.origin.clone(), direction, labels) {
            let edge = edge?;
            if seen.insert(edge.id().clone()) {
                edge_ids.push(edge.id().clone());
            }
        }
        if edge_ids.is_empty() {
            return Ok(VecDeque::new());
        }

        // Phase 2: both endpoint records of every edge in one batched scan
        let ranges = edge_ids
            .iter()
            .map(|id| layout::element_row_range(ElementKind::Edge, id))
            .collect();
        let scanner = reader
            .batch_scan(ranges)
            .with_filter(ColumnFilter::family(family::OUT_VERTEX))
            .with_filter(ColumnFilter::family(family::IN_VERTEX));

        let mut pairs: HashMap<ElementId, EndpointPair> = HashMap::with_capacity(edge_ids.len());
        for entry in scanner {
            let entry = entry?;
            let (_, edge_id) = layout::decode_element_key(&entry.key.row)?;
            let vertex = layout::decode_id(&entry.key.qualifier)?;
            let pair = pairs.entry(edge_id).or_default();
            if entry.key.family == Side::Out.vertex_family() {
                pair.out_vertex = Some(vertex);
            } else {
                pair.in_vertex = Some(vertex);
            }
        }

        let mut neighbors = VecDeque::with_capacity(edge_ids.len());
        for edge_id in &edge_ids {
            match pairs.remove(edge_id) {
                Some(EndpointPair {
                    out_vertex: Some(out_vertex),
                    in_vertex: Some(in_vertex),
                }) => {
                    let other = if out_vertex == self.origin {
                        in_vertex
                    } else {
                        out_vertex
                    };
                    neighbors.push_back(Vertex::new(other));
                }
                _ => warn!(
                    edge = %edge_id,
                    origin = %self.origin,
                    "edge endpoint records incomplete, skipping neighbor"
                ),
            }
        }
        debug!(origin = %self.origin, edges = edge_ids.len(), neighbors = neighbors.len(), "resolved neighbors");
        Ok(neighbors)
    }
}

impl Iterator for AdjacentVertices {
    type Item = GraphResult<Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Pending {
                    reader,
                    direction,
                    labels,
                } => match self.resolve(reader, direction, labels) {
                    Ok(neighbors) => self.state = State::Ready(neighbors),
                    Err(e) => return Some(Err(e)),
                },
                State::Ready(mut neighbors) => {
                    let next = neighbors.pop_front();
                    if next.is_some() {
                        self.state = State::Ready(neighbors);
                    }
                    return next.map(Ok);
                }
                State::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_support::{memory_graph, memory_graph_with};
    use crate::layout::{self, Side};
    use crate::storage::{KvStore, Mutation};
    use crate::types::{Direction, Vertex};
    use crate::Graph;
    use std::collections::BTreeSet;

    fn neighbor_ids(graph: &Graph, v: &Vertex, direction: Direction, labels: &[&str]) -> Vec<String> {
        let mut ids: Vec<String> = graph
            .adjacent_vertices(v, direction, labels)
            .unwrap()
            .map(|v| v.unwrap().id().to_string())
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_neighbors_by_direction() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        let c = graph.add_vertex(Some("c")).unwrap();
        graph.add_edge(Some("ab"), &a, &b, "knows").unwrap();
        graph.add_edge(Some("ca"), &c, &a, "likes").unwrap();

        assert_eq!(neighbor_ids(&graph, &a, Direction::Out, &[]), vec!["b"]);
        assert_eq!(neighbor_ids(&graph, &a, Direction::In, &[]), vec!["c"]);
        assert_eq!(neighbor_ids(&graph, &a, Direction::Both, &[]), vec!["b", "c"]);
        assert_eq!(neighbor_ids(&graph, &a, Direction::Both, &["likes"]), vec!["c"]);
        assert_eq!(neighbor_ids(&graph, &b, Direction::In, &[]), vec!["a"]);
        assert!(neighbor_ids(&graph, &b, Direction::Out, &[]).is_empty());
    }

    #[test]
    fn test_self_loop_yields_origin_once() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        graph.add_edge(Some("loop"), &a, &a, "self").unwrap();
        graph.add_edge(Some("ab"), &a, &b, "x").unwrap();

        assert_eq!(neighbor_ids(&graph, &a, Direction::Both, &[]), vec!["a", "b"]);
        assert_eq!(neighbor_ids(&graph, &a, Direction::Out, &[]), vec!["a", "b"]);
        assert_eq!(neighbor_ids(&graph, &a, Direction::In, &[]), vec!["a"]);
    }

    #[test]
    fn test_parallel_edges_repeat_neighbor() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        graph.add_edge(Some("e1"), &a, &b, "x").unwrap();
        graph.add_edge(Some("e2"), &a, &b, "x").unwrap();
        assert_eq!(neighbor_ids(&graph, &a, Direction::Out, &[]), vec!["b", "b"]);
    }

    #[test]
    fn test_many_neighbors_across_batches() {
        let graph = memory_graph_with(|c| {
            c.scan_batch_size = 3;
            c.query_threads = 3;
        });
        let hub = graph.add_vertex(Some("hub")).unwrap();
        let mut expected = BTreeSet::new();
        for i in 0..60 {
            let id = format!("n{:02}", i);
            let n = graph.add_vertex(Some(id.as_str())).unwrap();
            graph.add_edge(None, &hub, &n, "spoke").unwrap();
            expected.insert(id);
        }
        let found: BTreeSet<String> = neighbor_ids(&graph, &hub, Direction::Out, &[])
            .into_iter()
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_incomplete_edge_is_skipped() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        let c = graph.add_vertex(Some("c")).unwrap();
        let broken = graph.add_edge(Some("ab"), &a, &b, "x").unwrap();
        graph.add_edge(Some("ac"), &a, &c, "x").unwrap();
        graph
            .store()
            .apply(
                "graph",
                &[Mutation::delete(
                    layout::endpoint_key(broken.id(), Side::In, b.id()).encode(),
                )],
            )
            .unwrap();

        assert_eq!(neighbor_ids(&graph, &a, Direction::Out, &[]), vec!["c"]);
    }

    #[test]
    fn test_abandoned_iterator_is_harmless() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        for id in ["b", "c"] {
            let v = graph.add_vertex(Some(id)).unwrap();
            graph.add_edge(None, &a, &v, "x").unwrap();
        }
        let mut iter = graph.adjacent_vertices(&a, Direction::Out, &[]).unwrap();
        assert!(iter.next().is_some());
        drop(iter);
        graph.remove_vertex(&a).unwrap();
        assert_eq!(graph.edges().unwrap().count(), 0);
    }
}
