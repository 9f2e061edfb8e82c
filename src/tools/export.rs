/// Data export utilities
///
/// Supports exporting graph data to:
/// - CSV files (vertices and edges)
/// - JSON files

use super::{EdgeRecord, GraphDocument, ToolResult, VertexRecord};
use crate::graph::Graph;
use crate::types::Value;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Export options
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Pretty-print JSON output
    pub pretty_json: bool,
    /// Include header row in CSV
    pub csv_header: bool,
    /// Progress reporting interval
    pub progress_interval: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pretty_json: true,
            csv_header: true,
            progress_interval: 10000,
        }
    }
}

fn properties_json(properties: &BTreeMap<String, Value>) -> ToolResult<String> {
    let object: serde_json::Map<String, JsonValue> = properties
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    Ok(serde_json::to_string(&JsonValue::Object(object))?)
}

/// Export vertices to CSV file
///
/// Columns: `id`, `properties` (JSON object)
pub fn export_vertices_to_csv<P: AsRef<Path>>(
    graph: &Graph,
    path: P,
    options: &ExportOptions,
) -> ToolResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    if options.csv_header {
        writer.write_record(["id", "properties"])?;
    }

    let mut count = 0;
    for vertex in graph.vertices()? {
        let vertex = vertex?;
        let properties = properties_json(&graph.properties(&vertex)?)?;
        writer.write_record([vertex.id().as_str(), properties.as_str()])?;
        count += 1;

        if count % options.progress_interval.max(1) == 0 {
            info!(count, "exported vertices");
        }
    }

    writer.flush()?;
    Ok(count)
}

/// Export edges to CSV file
///
/// Columns: `id`, `label`, `out`, `in`, `properties` (JSON object)
pub fn export_edges_to_csv<P: AsRef<Path>>(
    graph: &Graph,
    path: P,
    options: &ExportOptions,
) -> ToolResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    if options.csv_header {
        writer.write_record(["id", "label", "out", "in", "properties"])?;
    }

    let mut count = 0;
    for edge in graph.edges()? {
        let edge = edge?;
        let properties = properties_json(&graph.properties(&edge)?)?;
        writer.write_record([
            edge.id().as_str(),
            edge.label(),
            edge.out_vertex_id().as_str(),
            edge.in_vertex_id().as_str(),
            properties.as_str(),
        ])?;
        count += 1;

        if count % options.progress_interval.max(1) == 0 {
            info!(count, "exported edges");
        }
    }

    writer.flush()?;
    Ok(count)
}

/// Export entire graph to CSV files (separate files for vertices and edges)
pub fn export_to_csv<P: AsRef<Path>>(
    graph: &Graph,
    vertices_path: P,
    edges_path: P,
    options: &ExportOptions,
) -> ToolResult<(usize, usize)> {
    let vertices = export_vertices_to_csv(graph, vertices_path, options)?;
    let edges = export_edges_to_csv(graph, edges_path, options)?;
    info!(vertices, edges, "CSV export complete");
    Ok((vertices, edges))
}

/// Export entire graph to JSON file
pub fn export_to_json<P: AsRef<Path>>(
    graph: &Graph,
    path: P,
    options: &ExportOptions,
) -> ToolResult<(usize, usize)> {
    let mut document = GraphDocument::default();

    for vertex in graph.vertices()? {
        let vertex = vertex?;
        document.vertices.push(VertexRecord {
            properties: graph.properties(&vertex)?,
            id: Some(vertex.into_id().into_string()),
        });
    }

    for edge in graph.edges()? {
        let edge = edge?;
        document.edges.push(EdgeRecord {
            properties: graph.properties(&edge)?,
            id: Some(edge.id().to_string()),
            label: edge.label().to_string(),
            out: edge.out_vertex_id().to_string(),
            in_vertex: edge.in_vertex_id().to_string(),
        });
    }

    let file = BufWriter::new(File::create(path)?);
    if options.pretty_json {
        serde_json::to_writer_pretty(file, &document)?;
    } else {
        serde_json::to_writer(file, &document)?;
    }

    info!(
        vertices = document.vertices.len(),
        edges = document.edges.len(),
        "JSON export complete"
    );
    Ok((document.vertices.len(), document.edges.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::memory_graph;
    use tempfile::TempDir;

    fn sample_graph() -> Graph {
        let graph = memory_graph();
        let alice = graph.add_vertex(Some("alice")).unwrap();
        let bob = graph.add_vertex(Some("bob")).unwrap();
        graph.set_property(&alice, "name", "Alice").unwrap();
        graph.set_property(&alice, "age", 30).unwrap();
        graph.set_property(&bob, "name", "Bob").unwrap();
        let e = graph.add_edge(Some("k1"), &alice, &bob, "KNOWS").unwrap();
        graph.set_property(&e, "since", 2020).unwrap();
        graph
    }

    #[test]
    fn test_export_to_json() {
        let temp_dir = TempDir::new().unwrap();
        let graph = sample_graph();
        let json_path = temp_dir.path().join("export.json");

        let (v_count, e_count) =
            export_to_json(&graph, &json_path, &ExportOptions::default()).unwrap();
        assert_eq!(v_count, 2);
        assert_eq!(e_count, 1);

        let content = std::fs::read_to_string(&json_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["vertices"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["edges"][0]["label"], "KNOWS");
        assert_eq!(parsed["edges"][0]["in"], "bob");
    }

    #[test]
    fn test_export_to_csv() {
        let temp_dir = TempDir::new().unwrap();
        let graph = sample_graph();
        let vertices_path = temp_dir.path().join("vertices.csv");
        let edges_path = temp_dir.path().join("edges.csv");

        let counts = export_to_csv(
            &graph,
            vertices_path.as_path(),
            edges_path.as_path(),
            &ExportOptions::default(),
        )
        .unwrap();
        assert_eq!(counts, (2, 1));

        let vertices = std::fs::read_to_string(&vertices_path).unwrap();
        let mut lines = vertices.lines();
        assert_eq!(lines.next(), Some("id,properties"));
        assert!(lines.next().unwrap().starts_with("alice,"));

        let edges = std::fs::read_to_string(&edges_path).unwrap();
        assert!(edges.contains("k1,KNOWS,alice,bob,"));
    }
}
