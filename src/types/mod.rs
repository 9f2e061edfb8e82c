//! Core data types for the graph
//!
//! - ElementId: opaque string identifier shared by vertices and edges
//! - Vertex / Edge: identity-only element handles
//! - Value: closed set of property value shapes
//! - ElementKind / Direction: element partitioning and traversal direction

pub mod edge;
pub mod element;
pub mod element_id;
pub mod value;
pub mod vertex;

pub use edge::Edge;
pub use element::{Direction, Element, ElementKind, GraphElement};
pub use element_id::{ElementId, ElementIdError};
pub use value::{Value, ValueError};
pub use vertex::Vertex;
