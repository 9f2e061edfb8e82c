/// Data import and export tools
///
/// Moves whole graphs in and out of a store:
/// - JSON documents (lossless, property values keep their exact type)
/// - CSV files, one for vertices and one for edges (properties as a JSON column)

pub mod export;
pub mod import;

pub use export::{export_to_csv, export_to_json, ExportOptions};
pub use import::{import_from_csv, import_from_json, ImportOptions, ImportStats};

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Import/export errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    GraphError(#[from] crate::error::GraphError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Whole-graph JSON document
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    pub vertices: Vec<VertexRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    pub out: String,
    #[serde(rename = "in")]
    pub in_vertex: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}
