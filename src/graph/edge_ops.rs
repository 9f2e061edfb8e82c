//! Edge create / read / delete

use super::{resolve_id, Graph};
use crate::error::{GraphError, GraphResult};
use crate::layout::{self, family, Side};
use crate::storage::{ColumnFilter, Entry, Mutation};
use crate::types::{Edge, ElementId, ElementKind, Vertex};
use tracing::{debug, warn};

impl Graph {
    /// Create an edge from `out_vertex` to `in_vertex`
    ///
    /// Writes the edge's existence and endpoint records and one adjacency
    /// record on each endpoint vertex. Readers running concurrently may see
    /// some of these records before the others.
    ///
    /// # Returns
    /// * `Err(GraphError::InvalidArgument)` for an empty label or id, or a
    ///   missing endpoint vertex
    /// * `Err(GraphError::DuplicateId)` if the id is already in use
    pub fn add_edge(
        &self,
        id: Option<&str>,
        out_vertex: &Vertex,
        in_vertex: &Vertex,
        label: &str,
    ) -> GraphResult<Edge> {
        if label.is_empty() {
            return Err(GraphError::InvalidArgument("edge label cannot be empty".into()));
        }
        let id = resolve_id(id)?;
        for endpoint in [out_vertex, in_vertex] {
            if !self.exists(ElementKind::Vertex, endpoint.id())? {
                return Err(GraphError::InvalidArgument(format!(
                    "vertex {} does not exist",
                    endpoint.id()
                )));
            }
        }
        self.ensure_unused(&id)?;

        let out_id = out_vertex.id();
        let in_id = in_vertex.id();
        self.writer.add_mutations([
            Mutation::put(layout::edge_exists_key(&id, label).encode(), Vec::new()),
            Mutation::put(layout::endpoint_key(&id, Side::Out, out_id).encode(), Vec::new()),
            Mutation::put(layout::endpoint_key(&id, Side::In, in_id).encode(), Vec::new()),
            Mutation::put(
                layout::adjacency_key(out_id, Side::Out, &id).encode(),
                layout::encode_adjacency_value(label, in_id),
            ),
            Mutation::put(
                layout::adjacency_key(in_id, Side::In, &id).encode(),
                layout::encode_adjacency_value(label, out_id),
            ),
        ])?;

        debug!(edge = %id, out_vertex = %out_id, in_vertex = %in_id, label, "added edge");
        Ok(Edge::new(id, label, out_id.clone(), in_id.clone()))
    }

    /// Look up an edge; `Ok(None)` if it does not exist
    ///
    /// An edge whose endpoint records are incomplete is reported as absent.
    pub fn get_edge(&self, id: &str) -> GraphResult<Option<Edge>> {
        let id = ElementId::new(id)?;
        let entries: Vec<Entry> = self
            .reader()?
            .scan(layout::element_row_range(ElementKind::Edge, &id))
            .with_filters(edge_filters())
            .collect::<Result<_, _>>()?;
        edge_from_row(id, &entries)
    }

    /// Remove an edge
    ///
    /// Adjacency records are deleted from each endpoint vertex that still
    /// exists; a missing endpoint is logged and skipped. The edge's own row
    /// is deleted last.
    pub fn remove_edge(&self, edge: &Edge) -> GraphResult<()> {
        self.add_or_remove_from_index(edge, false)?;

        for (side, vertex) in [
            (Side::Out, edge.out_vertex_id()),
            (Side::In, edge.in_vertex_id()),
        ] {
            if self.exists(ElementKind::Vertex, vertex)? {
                self.writer.add_mutation(Mutation::delete(
                    layout::adjacency_key(vertex, side, edge.id()).encode(),
                ))?;
            } else {
                warn!(
                    edge = %edge.id(),
                    vertex = %vertex,
                    "endpoint vertex missing while removing edge, skipping its adjacency"
                );
            }
        }

        let removed = self.delete_row(ElementKind::Edge, edge.id())?;
        debug!(edge = %edge.id(), records = removed, "removed edge");
        Ok(())
    }
}

/// Families read to rebuild an edge handle
pub(super) fn edge_filters() -> [ColumnFilter; 3] {
    [
        ColumnFilter::family(family::EXISTS),
        ColumnFilter::family(family::OUT_VERTEX),
        ColumnFilter::family(family::IN_VERTEX),
    ]
}

/// Rebuild an edge from the existence and endpoint records of its row
pub(super) fn edge_from_row(id: ElementId, entries: &[Entry]) -> GraphResult<Option<Edge>> {
    let mut label = None;
    let mut out_vertex = None;
    let mut in_vertex = None;
    for entry in entries {
        let column = entry.key.family.as_slice();
        if column == family::EXISTS {
            label = Some(layout::decode_utf8(&entry.key.qualifier, "edge label")?);
        } else if column == family::OUT_VERTEX {
            out_vertex = Some(layout::decode_id(&entry.key.qualifier)?);
        } else if column == family::IN_VERTEX {
            in_vertex = Some(layout::decode_id(&entry.key.qualifier)?);
        }
    }

    match (label, out_vertex, in_vertex) {
        (None, _, _) => Ok(None),
        (Some(label), Some(out_vertex), Some(in_vertex)) => {
            Ok(Some(Edge::new(id, label, out_vertex, in_vertex)))
        }
        (Some(_), out_vertex, in_vertex) => {
            warn!(
                edge = %id,
                has_out = out_vertex.is_some(),
                has_in = in_vertex.is_some(),
                "edge has incomplete endpoint records, treating as absent"
            );
            Ok(None)
        }
    }
}
