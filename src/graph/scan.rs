//! Element enumeration
//!
//! All vertices (or edges) live in one contiguous key range, so enumeration
//! is one forward scan from the kind prefix to its sentinel. The iterators
//! are single-pass; every chunk they fetch reflects the store at fetch time.

use super::edge_ops::{edge_filters, edge_from_row};
use super::Graph;
use crate::error::{GraphError, GraphResult};
use crate::layout::{self, family};
use crate::storage::{ColumnFilter, Entry, KeyRange, RowGroups, Scanner};
use crate::types::{Edge, ElementId, ElementKind, Value, Vertex};
use tracing::debug;

impl Graph {
    pub fn vertices(&self) -> GraphResult<VertexIter> {
        self.scan_vertices(None, None)
    }

    /// Vertices with `min <= id <= max` in id order
    ///
    /// Give both bounds or neither; a single bound, or `min > max`, is
    /// `InvalidArgument`. Only existence records leave the store, but the
    /// store still steps over every adjacency and property record in the
    /// range, so cost grows with total vertex degree.
    pub fn scan_vertices(&self, min: Option<&str>, max: Option<&str>) -> GraphResult<VertexIter> {
        let range = scan_range(ElementKind::Vertex, min, max)?;
        let scanner = self
            .reader()?
            .scan(range)
            .with_filter(ColumnFilter::family(family::EXISTS));
        Ok(VertexIter { scanner })
    }

    pub fn edges(&self) -> GraphResult<EdgeIter> {
        self.scan_edges(None, None)
    }

    /// Edges with `min <= id <= max` in id order
    pub fn scan_edges(&self, min: Option<&str>, max: Option<&str>) -> GraphResult<EdgeIter> {
        let range = scan_range(ElementKind::Edge, min, max)?;
        let scanner = self.reader()?.scan(range).with_filters(edge_filters());
        Ok(EdgeIter {
            rows: RowGroups::new(scanner),
        })
    }

    /// Vertices whose property `key` equals `value`
    ///
    /// Uses the key index when `key` is indexed for vertices, otherwise scans
    /// every vertex.
    pub fn vertices_by(
        &self,
        key: &str,
        value: &Value,
    ) -> GraphResult<Box<dyn Iterator<Item = GraphResult<Vertex>> + '_>> {
        if self.is_key_indexed(ElementKind::Vertex, key) {
            let elements = self.get_elements(key, Some(value), ElementKind::Vertex)?;
            return Ok(Box::new(elements.filter_map(|element| match element {
                Ok(element) => element.as_vertex().cloned().map(Ok),
                Err(e) => Some(Err(e)),
            })));
        }
        Ok(Box::new(self.scan_vertices_with(key, value)?))
    }

    /// Edges whose property `key` equals `value`
    pub fn edges_by(
        &self,
        key: &str,
        value: &Value,
    ) -> GraphResult<Box<dyn Iterator<Item = GraphResult<Edge>> + '_>> {
        if self.is_key_indexed(ElementKind::Edge, key) {
            let elements = self.get_elements(key, Some(value), ElementKind::Edge)?;
            return Ok(Box::new(elements.filter_map(|element| match element {
                Ok(element) => element.as_edge().cloned().map(Ok),
                Err(e) => Some(Err(e)),
            })));
        }
        Ok(Box::new(self.scan_edges_with(key, value)?))
    }

    /// Full scan for vertices holding `key = value`, ignoring the index
    pub fn scan_vertices_with(&self, key: &str, value: &Value) -> GraphResult<FilteredVertices> {
        let encoded = self.codec.encode(value)?;
        debug!(key, "scanning vertices by property");
        Ok(FilteredVertices {
            rows: self.property_rows(ElementKind::Vertex, key, &[])?,
            encoded,
        })
    }

    /// Full scan for edges holding `key = value`, ignoring the index
    pub fn scan_edges_with(&self, key: &str, value: &Value) -> GraphResult<FilteredEdges> {
        let encoded = self.codec.encode(value)?;
        debug!(key, "scanning edges by property");
        Ok(FilteredEdges {
            rows: self.property_rows(ElementKind::Edge, key, &edge_filters())?,
            encoded,
        })
    }

    /// Rows of one kind with their existence record, the `key` property and
    /// any `extra` columns
    pub(super) fn property_rows(
        &self,
        kind: ElementKind,
        key: &str,
        extra: &[ColumnFilter],
    ) -> GraphResult<RowGroups<Scanner>> {
        if key.is_empty() {
            return Err(GraphError::InvalidArgument("property key cannot be empty".into()));
        }
        let scanner = self
            .reader()?
            .scan(layout::kind_scan_range(kind))
            .with_filter(ColumnFilter::family(family::EXISTS))
            .with_filter(ColumnFilter::column(family::PROPERTY, key.as_bytes()))
            .with_filters(extra.iter().cloned());
        Ok(RowGroups::new(scanner))
    }
}

fn scan_range(kind: ElementKind, min: Option<&str>, max: Option<&str>) -> GraphResult<KeyRange> {
    match (min, max) {
        (None, None) => Ok(layout::kind_scan_range(kind)),
        (Some(min), Some(max)) => {
            let min = ElementId::new(min)?;
            let max = ElementId::new(max)?;
            if min > max {
                return Err(GraphError::InvalidArgument(format!(
                    "range lower bound {} is above upper bound {}",
                    min, max
                )));
            }
            Ok(layout::id_scan_range(kind, &min, &max))
        }
        _ => Err(GraphError::InvalidArgument(
            "range bounds must both be given or both be omitted".into(),
        )),
    }
}

/// Split a grouped row into its id, existence flag and matching property bytes
fn inspect_row<'a>(
    row: &[u8],
    entries: &'a [Entry],
) -> GraphResult<(ElementId, bool, Option<&'a [u8]>)> {
    let (_, id) = layout::decode_element_key(row)?;
    let exists = entries.iter().any(|e| e.key.family == family::EXISTS);
    let property = entries
        .iter()
        .find(|e| e.key.family == family::PROPERTY)
        .map(|e| e.value.as_slice());
    Ok((id, exists, property))
}

/// Lazy vertex enumeration
pub struct VertexIter {
    scanner: Scanner,
}

impl Iterator for VertexIter {
    type Item = GraphResult<Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.scanner.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e.into())),
        };
        Some(
            layout::decode_element_key(&entry.key.row)
                .map(|(_, id)| Vertex::new(id))
                .map_err(Into::into),
        )
    }
}

/// Lazy edge enumeration
///
/// Rows whose endpoint records are incomplete are skipped with a warning.
pub struct EdgeIter {
    rows: RowGroups<Scanner>,
}

impl Iterator for EdgeIter {
    type Item = GraphResult<Edge>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (row, entries) = match self.rows.next()? {
                Ok(group) => group,
                Err(e) => return Some(Err(e.into())),
            };
            let edge = layout::decode_element_key(&row)
                .map_err(GraphError::from)
                .and_then(|(_, id)| edge_from_row(id, &entries));
            match edge {
                Ok(Some(edge)) => return Some(Ok(edge)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Scan-and-filter vertex lookup
pub struct FilteredVertices {
    rows: RowGroups<Scanner>,
    encoded: Vec<u8>,
}

impl Iterator for FilteredVertices {
    type Item = GraphResult<Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (row, entries) = match self.rows.next()? {
                Ok(group) => group,
                Err(e) => return Some(Err(e.into())),
            };
            match inspect_row(&row, &entries) {
                Ok((id, true, Some(bytes))) if bytes == self.encoded.as_slice() => {
                    return Some(Ok(Vertex::new(id)))
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Scan-and-filter edge lookup
pub struct FilteredEdges {
    rows: RowGroups<Scanner>,
    encoded: Vec<u8>,
}

impl Iterator for FilteredEdges {
    type Item = GraphResult<Edge>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (row, entries) = match self.rows.next()? {
                Ok(group) => group,
                Err(e) => return Some(Err(e.into())),
            };
            let (id, exists, property) = match inspect_row(&row, &entries) {
                Ok(parts) => parts,
                Err(e) => return Some(Err(e)),
            };
            if !exists || property != Some(self.encoded.as_slice()) {
                continue;
            }
            match edge_from_row(id, &entries) {
                Ok(Some(edge)) => return Some(Ok(edge)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_support::{memory_graph, memory_graph_with};
    use crate::types::Value;
    use crate::GraphError;

    fn ids<T: ToString>(items: impl Iterator<Item = crate::GraphResult<T>>) -> Vec<String> {
        items.map(|item| item.unwrap().to_string()).collect()
    }

    #[test]
    fn test_enumerate_vertices_in_id_order() {
        let graph = memory_graph();
        for id in ["c", "a", "b"] {
            graph.add_vertex(Some(id)).unwrap();
        }
        let a = graph.get_vertex("a").unwrap().unwrap();
        graph.set_property(&a, "p", 1).unwrap();
        graph.add_edge(Some("e"), &a, &a, "x").unwrap();

        let vertices: Vec<String> = graph
            .vertices()
            .unwrap()
            .map(|v| v.unwrap().id().to_string())
            .collect();
        assert_eq!(vertices, vec!["a", "b", "c"]);
        assert_eq!(graph.edges().unwrap().count(), 1);
    }

    #[test]
    fn test_range_bounded_enumeration() {
        let graph = memory_graph();
        for id in ["a", "b", "b1", "c", "d", "e"] {
            graph.add_vertex(Some(id)).unwrap();
        }
        let bounded: Vec<String> = graph
            .scan_vertices(Some("b"), Some("d"))
            .unwrap()
            .map(|v| v.unwrap().id().to_string())
            .collect();
        assert_eq!(bounded, vec!["b", "b1", "c", "d"]);

        assert!(matches!(
            graph.scan_vertices(Some("b"), None),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(matches!(
            graph.scan_edges(None, Some("b")),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_edge_enumeration_with_properties() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        let e1 = graph.add_edge(Some("e1"), &a, &b, "x").unwrap();
        graph.set_property(&e1, "w", 1).unwrap();
        graph.add_edge(Some("e2"), &b, &a, "y").unwrap();

        let edges: Vec<_> = graph.edges().unwrap().map(|e| e.unwrap()).collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0], e1);
        assert_eq!(edges[1].label(), "y");

        let bounded = ids(graph.scan_edges(Some("e2"), Some("e9")).unwrap());
        assert_eq!(bounded.len(), 1);
    }

    #[test]
    fn test_scan_by_property() {
        let graph = memory_graph();
        let a = graph.add_vertex(Some("a")).unwrap();
        let b = graph.add_vertex(Some("b")).unwrap();
        let c = graph.add_vertex(Some("c")).unwrap();
        graph.set_property(&a, "color", "red").unwrap();
        graph.set_property(&b, "color", "blue").unwrap();
        graph.set_property(&c, "color", "red").unwrap();
        graph.set_property(&c, "size", 3).unwrap();

        let red: Vec<String> = graph
            .vertices_by("color", &Value::from("red"))
            .unwrap()
            .map(|v| v.unwrap().id().to_string())
            .collect();
        assert_eq!(red, vec!["a", "c"]);

        let e = graph.add_edge(Some("e"), &a, &b, "x").unwrap();
        graph.set_property(&e, "color", "red").unwrap();
        let red_edges: Vec<_> = graph
            .edges_by("color", &Value::from("red"))
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(red_edges, vec![e]);
        assert_eq!(graph.edges_by("color", &Value::from("blue")).unwrap().count(), 0);
    }

    #[test]
    fn test_enumeration_past_a_hub_vertex() {
        let graph = memory_graph_with(|c| c.scan_batch_size = 2);
        let hub = graph.add_vertex(Some("a")).unwrap();
        for i in 0..20 {
            let v = graph.add_vertex(Some(format!("b{:02}", i).as_str())).unwrap();
            graph.add_edge(None, &hub, &v, "spoke").unwrap();
            graph.set_property(&hub, &format!("k{:02}", i), i).unwrap();
        }
        let all = ids(graph.vertices().unwrap());
        assert_eq!(all.len(), 21);
        assert_eq!(all[0], "a");
        assert_eq!(ids(graph.scan_vertices_with("k07", &Value::Int(7)).unwrap()), vec!["a"]);
    }
}
