//! Traversal engine
//!
//! - `AdjacentEdges`: edges incident to a vertex, read from the vertex's
//!   own adjacency records in one row scan
//! - `AdjacentVertices`: the vertex at the far end of each such edge,
//!   resolved with one multi-range scan over the edges' endpoint records

mod adjacent;
mod neighbors;

pub use adjacent::AdjacentEdges;
pub use neighbors::AdjacentVertices;

use crate::error::GraphResult;
use crate::graph::Graph;
use crate::types::{Direction, Vertex};
use std::collections::HashSet;

/// Label filter; empty means every label
pub(crate) fn label_set(labels: &[&str]) -> HashSet<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

impl Graph {
    /// Edges incident to `vertex` in `direction`, in edge id order per side
    ///
    /// With `Direction::Both`, in edges come before out edges and a self-loop
    /// is reported once from each side.
    pub fn adjacent_edges(
        &self,
        vertex: &Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<AdjacentEdges> {
        Ok(AdjacentEdges::new(
            self.reader()?.clone(),
            vertex.id().clone(),
            direction,
            label_set(labels),
        ))
    }

    /// Vertices at the far end of each edge `adjacent_edges` would return
    ///
    /// One result per edge, so parallel edges repeat a neighbor. A self-loop
    /// yields the origin exactly once, whatever the direction.
    pub fn adjacent_vertices(
        &self,
        vertex: &Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<AdjacentVertices> {
        Ok(AdjacentVertices::new(
            self.reader()?.clone(),
            vertex.id().clone(),
            direction,
            label_set(labels),
        ))
    }
}
