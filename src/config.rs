//! Graph configuration
//!
//! Loaded from a JSON file or from `KVGRAPH_*` environment variables (a
//! `.env` file is honoured). Every field has a default, so a config file
//! only needs the settings it changes.

use crate::codec::{codec_by_name, SharedCodec};
use crate::error::{GraphError, GraphResult};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which store backs the graph
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    RocksDb { path: PathBuf },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber
    ///
    /// `RUST_LOG` overrides the configured level.
    pub fn init(&self) -> GraphResult<()> {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&self.level));

        let result = match self.format.as_str() {
            "json" => tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init(),
            _ => tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init(),
        };
        result.map_err(|e| GraphError::Config(format!("cannot install logger: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub backend: BackendConfig,

    /// Table holding element rows
    pub graph_table: String,

    /// Table holding the key index; `None` disables key indexing
    pub index_table: Option<String>,

    /// Value codec name (`binary` or `json`)
    pub codec: String,

    /// Apply every mutation as soon as it is issued
    pub autoflush: bool,

    /// Read the previous value in `remove_property` even for unindexed keys
    pub return_removed_property_values: bool,

    pub max_buffered_mutations: usize,
    pub scan_batch_size: usize,

    /// Threads used by multi-range scans
    pub query_threads: usize,

    pub logging: LoggingConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::RocksDb {
                path: PathBuf::from("./data/kvgraph"),
            },
            graph_table: "graph".to_string(),
            index_table: Some("graph_index".to_string()),
            codec: "binary".to_string(),
            autoflush: true,
            return_removed_property_values: true,
            max_buffered_mutations: 1000,
            scan_batch_size: 256,
            query_threads: 2,
            logging: LoggingConfig::default(),
        }
    }
}

impl GraphConfig {
    /// Defaults with an in-memory store
    pub fn in_memory() -> Self {
        Self {
            backend: BackendConfig::Memory,
            ..Self::default()
        }
    }

    /// Defaults with a RocksDB store at `path`
    pub fn rocksdb(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::RocksDb { path: path.into() },
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> GraphResult<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from a variable lookup, starting from defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GraphResult<Self> {
        let mut config = Self::default();

        let backend = lookup("KVGRAPH_BACKEND").unwrap_or_else(|| "rocksdb".to_string());
        config.backend = match backend.as_str() {
            "memory" => BackendConfig::Memory,
            "rocksdb" => BackendConfig::RocksDb {
                path: lookup("KVGRAPH_DB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data/kvgraph")),
            },
            other => return Err(GraphError::Config(format!("unknown backend '{}'", other))),
        };

        if let Some(table) = lookup("KVGRAPH_GRAPH_TABLE") {
            config.graph_table = table;
        }
        if let Some(table) = lookup("KVGRAPH_INDEX_TABLE") {
            // An empty value turns indexing off
            config.index_table = Some(table).filter(|t| !t.is_empty());
        }
        if let Some(codec) = lookup("KVGRAPH_CODEC") {
            config.codec = codec;
        }
        parse_var(&lookup, "KVGRAPH_AUTOFLUSH", &mut config.autoflush)?;
        parse_var(
            &lookup,
            "KVGRAPH_RETURN_REMOVED_VALUES",
            &mut config.return_removed_property_values,
        )?;
        parse_var(&lookup, "KVGRAPH_MAX_BUFFERED", &mut config.max_buffered_mutations)?;
        parse_var(&lookup, "KVGRAPH_SCAN_BATCH", &mut config.scan_batch_size)?;
        parse_var(&lookup, "KVGRAPH_QUERY_THREADS", &mut config.query_threads)?;

        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> GraphResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            GraphError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            GraphError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GraphResult<()> {
        if self.graph_table.is_empty() {
            return Err(GraphError::Config("graph_table cannot be empty".into()));
        }
        if let Some(index) = &self.index_table {
            if index.is_empty() {
                return Err(GraphError::Config("index_table cannot be empty".into()));
            }
            if *index == self.graph_table {
                return Err(GraphError::Config(
                    "graph_table and index_table must differ".into(),
                ));
            }
        }
        if self.max_buffered_mutations == 0 {
            return Err(GraphError::Config("max_buffered_mutations must be positive".into()));
        }
        if self.scan_batch_size == 0 {
            return Err(GraphError::Config("scan_batch_size must be positive".into()));
        }
        if self.query_threads == 0 {
            return Err(GraphError::Config("query_threads must be positive".into()));
        }
        self.value_codec()?;
        Ok(())
    }

    pub fn value_codec(&self) -> GraphResult<SharedCodec> {
        codec_by_name(&self.codec)
            .ok_or_else(|| GraphError::Config(format!("unknown codec '{}'", self.codec)))
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    slot: &mut T,
) -> GraphResult<()>
where
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(name) {
        *slot = raw
            .parse()
            .map_err(|e| GraphError::Config(format!("{}='{}': {}", name, raw, e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = GraphConfig::default();
        config.validate().unwrap();
        assert_eq!(config.graph_table, "graph");
        assert_eq!(config.index_table.as_deref(), Some("graph_index"));
        assert!(config.autoflush);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("KVGRAPH_BACKEND", "memory"),
            ("KVGRAPH_INDEX_TABLE", ""),
            ("KVGRAPH_AUTOFLUSH", "false"),
            ("KVGRAPH_SCAN_BATCH", "16"),
            ("LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();
        let config = GraphConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.backend, BackendConfig::Memory);
        assert_eq!(config.index_table, None);
        assert!(!config.autoflush);
        assert_eq!(config.scan_batch_size, 16);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_number = |k: &str| (k == "KVGRAPH_QUERY_THREADS").then(|| "many".to_string());
        assert!(matches!(
            GraphConfig::from_lookup(bad_number),
            Err(GraphError::Config(_))
        ));

        let bad_backend = |k: &str| (k == "KVGRAPH_BACKEND").then(|| "accumulo".to_string());
        assert!(GraphConfig::from_lookup(bad_backend).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = GraphConfig::in_memory();
        config.index_table = Some("graph".into());
        assert!(config.validate().is_err());

        let mut config = GraphConfig::in_memory();
        config.scan_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = GraphConfig::in_memory();
        config.codec = "xml".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(
            &path,
            r#"{"backend": {"type": "rocksdb", "path": "/tmp/g"}, "autoflush": false, "codec": "json"}"#,
        )
        .unwrap();

        let config = GraphConfig::from_json_file(&path).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::RocksDb {
                path: PathBuf::from("/tmp/g")
            }
        );
        assert!(!config.autoflush);
        assert_eq!(config.codec, "json");
        assert_eq!(config.graph_table, "graph");
    }
}
