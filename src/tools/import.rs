/// Data import utilities
///
/// Supports importing graph data from:
/// - JSON documents written by `export_to_json`
/// - CSV files (vertices and edges) written by `export_to_csv`
///
/// Vertices are imported before edges so that edge endpoints resolve.

use super::{EdgeRecord, GraphDocument, ToolError, ToolResult, VertexRecord};
use crate::graph::Graph;
use crate::types::{Value, Vertex};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Import options
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Skip invalid rows instead of failing
    pub skip_errors: bool,
    /// Flush the graph writer every this many elements
    pub batch_size: usize,
    /// Progress reporting interval (rows)
    pub progress_interval: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_errors: false,
            batch_size: 1000,
            progress_interval: 10000,
        }
    }
}

/// Import statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportStats {
    pub vertices_imported: usize,
    pub edges_imported: usize,
    pub vertices_skipped: usize,
    pub edges_skipped: usize,
    pub errors: Vec<String>,
}

impl ImportStats {
    fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}

/// CSV vertex row
#[derive(Debug, Deserialize)]
struct CsvVertex {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    properties: Option<String>,
}

/// CSV edge row
#[derive(Debug, Deserialize)]
struct CsvEdge {
    #[serde(default)]
    id: Option<String>,
    label: String,
    out: String,
    #[serde(rename = "in")]
    in_vertex: String,
    #[serde(default)]
    properties: Option<String>,
}

fn import_vertex(graph: &Graph, record: &VertexRecord) -> ToolResult<()> {
    let id = record.id.as_deref().filter(|id| !id.is_empty());
    let vertex = graph.add_vertex(id)?;
    for (key, value) in &record.properties {
        graph.set_property(&vertex, key, value.clone())?;
    }
    Ok(())
}

fn import_edge(graph: &Graph, record: &EdgeRecord) -> ToolResult<()> {
    let endpoint = |id: &str| -> ToolResult<Vertex> {
        graph.get_vertex(id)?.ok_or_else(|| {
            ToolError::InvalidFormat(format!("edge endpoint {} does not exist", id))
        })
    };
    let out_vertex = endpoint(&record.out)?;
    let in_vertex = endpoint(&record.in_vertex)?;
    let id = record.id.as_deref().filter(|id| !id.is_empty());
    let edge = graph.add_edge(id, &out_vertex, &in_vertex, &record.label)?;
    for (key, value) in &record.properties {
        graph.set_property(&edge, key, value.clone())?;
    }
    Ok(())
}

/// Parse a CSV properties column (a JSON object, possibly empty)
fn parse_properties(raw: Option<&str>) -> ToolResult<BTreeMap<String, Value>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(BTreeMap::new()),
        Some(raw) => raw,
    };
    match serde_json::from_str::<JsonValue>(raw)? {
        JsonValue::Object(map) => map
            .into_iter()
            .map(|(k, v)| {
                Value::try_from(v)
                    .map(|v| (k.clone(), v))
                    .map_err(|e| ToolError::InvalidFormat(format!("property {}: {}", k, e)))
            })
            .collect(),
        other => Err(ToolError::InvalidFormat(format!(
            "properties must be a JSON object, got {}",
            other
        ))),
    }
}

struct Progress<'a> {
    graph: &'a Graph,
    options: &'a ImportOptions,
    stats: ImportStats,
}

impl Progress<'_> {
    /// Record one row's outcome; returns the error if it must abort the import
    fn record(&mut self, row: usize, is_edge: bool, result: ToolResult<()>) -> ToolResult<()> {
        match result {
            Ok(()) => {
                let done = if is_edge {
                    self.stats.edges_imported += 1;
                    self.stats.edges_imported
                } else {
                    self.stats.vertices_imported += 1;
                    self.stats.vertices_imported
                };
                if done % self.options.batch_size.max(1) == 0 {
                    self.graph.flush()?;
                }
                if done % self.options.progress_interval.max(1) == 0 {
                    info!(done, edges = is_edge, "import progress");
                }
                Ok(())
            }
            Err(e) if self.options.skip_errors => {
                warn!(row, error = %e, "skipping row");
                if is_edge {
                    self.stats.edges_skipped += 1;
                } else {
                    self.stats.vertices_skipped += 1;
                }
                self.stats.add_error(format!("Row {}: {}", row, e));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Import a JSON document written by `export_to_json`
pub fn import_from_json<P: AsRef<Path>>(
    graph: &Graph,
    path: P,
    options: &ImportOptions,
) -> ToolResult<ImportStats> {
    let file = BufReader::new(File::open(path)?);
    let document: GraphDocument = serde_json::from_reader(file)?;

    let mut progress = Progress {
        graph,
        options,
        stats: ImportStats::default(),
    };
    for (row, record) in document.vertices.iter().enumerate() {
        progress.record(row, false, import_vertex(graph, record))?;
    }
    for (row, record) in document.edges.iter().enumerate() {
        progress.record(row, true, import_edge(graph, record))?;
    }
    graph.flush()?;

    info!(
        vertices = progress.stats.vertices_imported,
        edges = progress.stats.edges_imported,
        "JSON import complete"
    );
    Ok(progress.stats)
}

/// Import vertex and edge CSV files
///
/// Vertex CSV format:
/// ```csv
/// id,properties
/// alice,"{""name"": ""Alice"", ""age"": 30}"
/// ,{}
/// ```
///
/// Edge CSV format:
/// ```csv
/// id,label,out,in,properties
/// k1,KNOWS,alice,bob,"{""since"": 2020}"
/// ```
///
/// Empty ids are generated. CSV property values come from JSON, so bytes
/// and the int/float distinction of whole-number floats are not preserved.
pub fn import_from_csv<P: AsRef<Path>>(
    graph: &Graph,
    vertices_path: P,
    edges_path: P,
    options: &ImportOptions,
) -> ToolResult<ImportStats> {
    let mut progress = Progress {
        graph,
        options,
        stats: ImportStats::default(),
    };

    let mut vertices = csv::Reader::from_path(vertices_path)?;
    for (row, result) in vertices.deserialize::<CsvVertex>().enumerate() {
        let outcome = result.map_err(ToolError::from).and_then(|rec| {
            import_vertex(
                graph,
                &VertexRecord {
                    id: rec.id,
                    properties: parse_properties(rec.properties.as_deref())?,
                },
            )
        });
        progress.record(row, false, outcome)?;
    }

    let mut edges = csv::Reader::from_path(edges_path)?;
    for (row, result) in edges.deserialize::<CsvEdge>().enumerate() {
        let outcome = result.map_err(ToolError::from).and_then(|rec| {
            import_edge(
                graph,
                &EdgeRecord {
                    id: rec.id,
                    label: rec.label,
                    out: rec.out,
                    in_vertex: rec.in_vertex,
                    properties: parse_properties(rec.properties.as_deref())?,
                },
            )
        });
        progress.record(row, true, outcome)?;
    }
    graph.flush()?;

    info!(
        vertices = progress.stats.vertices_imported,
        edges = progress.stats.edges_imported,
        "CSV import complete"
    );
    Ok(progress.stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::memory_graph;
    use crate::tools::export::{export_to_csv, export_to_json, ExportOptions};
    use crate::types::Direction;
    use tempfile::TempDir;

    #[test]
    fn test_json_roundtrip_preserves_graph() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.json");

        let source = memory_graph();
        let a = source.add_vertex(Some("a")).unwrap();
        let b = source.add_vertex(Some("b")).unwrap();
        source.set_property(&a, "blob", vec![0u8, 1, 2]).unwrap();
        source.set_property(&a, "score", 1.0).unwrap();
        let e = source.add_edge(Some("e"), &a, &b, "knows").unwrap();
        source.set_property(&e, "since", 2020).unwrap();
        export_to_json(&source, &path, &ExportOptions::default()).unwrap();

        let target = memory_graph();
        let stats = import_from_json(&target, &path, &ImportOptions::default()).unwrap();
        assert_eq!(stats.vertices_imported, 2);
        assert_eq!(stats.edges_imported, 1);

        let a2 = target.get_vertex("a").unwrap().unwrap();
        assert_eq!(target.properties(&a2).unwrap(), source.properties(&a).unwrap());
        let e2 = target.get_edge("e").unwrap().unwrap();
        assert_eq!(e2, e);
        assert_eq!(target.get_property(&e2, "since").unwrap(), Some(Value::Int(2020)));
    }

    #[test]
    fn test_csv_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let vertices_path = temp_dir.path().join("vertices.csv");
        let edges_path = temp_dir.path().join("edges.csv");

        let source = memory_graph();
        let a = source.add_vertex(Some("a")).unwrap();
        let b = source.add_vertex(Some("b")).unwrap();
        source.set_property(&a, "name", "Alice").unwrap();
        source.add_edge(Some("e"), &a, &b, "knows").unwrap();
        export_to_csv(
            &source,
            vertices_path.as_path(),
            edges_path.as_path(),
            &ExportOptions::default(),
        )
        .unwrap();

        let target = memory_graph();
        let stats = import_from_csv(
            &target,
            vertices_path.as_path(),
            edges_path.as_path(),
            &ImportOptions::default(),
        )
        .unwrap();
        assert_eq!((stats.vertices_imported, stats.edges_imported), (2, 1));

        let a2 = target.get_vertex("a").unwrap().unwrap();
        assert_eq!(target.get_property(&a2, "name").unwrap(), Some(Value::from("Alice")));
        assert_eq!(target.adjacent_vertices(&a2, Direction::Out, &[]).unwrap().count(), 1);
    }

    #[test]
    fn test_skip_errors() {
        let temp_dir = TempDir::new().unwrap();
        let vertices_path = temp_dir.path().join("vertices.csv");
        let edges_path = temp_dir.path().join("edges.csv");
        std::fs::write(&vertices_path, "id,properties\na,{}\na,{}\nb,\"{\"\"x\"\": null}\"\n").unwrap();
        std::fs::write(&edges_path, "id,label,out,in,properties\ne,knows,a,ghost,\n").unwrap();

        let graph = memory_graph();
        let strict = import_from_csv(
            &graph,
            vertices_path.as_path(),
            edges_path.as_path(),
            &ImportOptions::default(),
        );
        assert!(strict.is_err());

        let graph = memory_graph();
        let options = ImportOptions {
            skip_errors: true,
            ..ImportOptions::default()
        };
        let stats =
            import_from_csv(&graph, vertices_path.as_path(), edges_path.as_path(), &options).unwrap();
        assert_eq!(stats.vertices_imported, 1);
        assert_eq!(stats.vertices_skipped, 2);
        assert_eq!(stats.edges_skipped, 1);
        assert_eq!(stats.errors.len(), 3);
    }
}
