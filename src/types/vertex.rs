use super::element::{Element, ElementKind};
use super::element_id::ElementId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vertex handle
///
/// Identifies a vertex by id. Properties and incident edges are read from
/// the store on demand through [`crate::Graph`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    id: ElementId,
}

impl Vertex {
    pub fn new(id: ElementId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn into_id(self) -> ElementId {
        self.id
    }
}

impl Element for Vertex {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Vertex
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[V:{}]", self.id)
    }
}
