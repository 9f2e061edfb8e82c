/// kvgraph
///
/// A property graph stored in an ordered key-value store.
///
/// # Architecture
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │                    kvgraph                       │
/// ├──────────────────────────────────────────────────┤
/// │  ┌──────────────────┐   ┌────────────────────┐   │
/// │  │ Traversal Engine │   │     Key Index      │   │
/// │  └────────┬─────────┘   └─────────┬──────────┘   │
/// │           ↓                       ↓              │
/// │  ┌────────────────────────────────────────────┐  │
/// │  │   Element Store (vertices, edges, props)   │  │
/// │  └────────────────────┬───────────────────────┘  │
/// │                       ↓                          │
/// │  ┌────────────────────────────────────────────┐  │
/// │  │   Key Layout + Codec (row/family/qualifier)│  │
/// │  └────────────────────┬───────────────────────┘  │
/// │                       ↓                          │
/// │  ┌────────────────────────────────────────────┐  │
/// │  │   Ordered KV store (RocksDB / in-memory)   │  │
/// │  └────────────────────────────────────────────┘  │
/// └──────────────────────────────────────────────────┘
/// ```
///
/// # Modules
///
/// - `types`: Core data types (ElementId, Vertex, Edge, Value)
/// - `codec`: Value codecs and order-preserving key components
/// - `layout`: Record layout of the graph and index tables
/// - `storage`: Store abstraction, backends, scanners and writers
/// - `graph`: Element store (`Graph`)
/// - `traversal`: Adjacent edges and neighbor vertices
/// - `index`: Key index maintenance and lookup
/// - `config`: Graph configuration
/// - `tools`: Import and export

pub mod codec;
pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod layout;
pub mod storage;
pub mod tools;
pub mod traversal;
pub mod types;

// Re-export commonly used types
pub use types::{Direction, Edge, Element, ElementId, ElementKind, GraphElement, Value, Vertex};

pub use config::{BackendConfig, GraphConfig, LoggingConfig};
pub use error::{GraphError, GraphResult};
pub use graph::Graph;

// Re-export storage types
pub use storage::{KvStore, MemoryStore, RocksDbStore, SharedStore, StorageError, StorageResult};

// Re-export codec types
pub use codec::{BinaryCodec, CodecError, JsonCodec, ValueCodec};

// Re-export traversal types
pub use traversal::{AdjacentEdges, AdjacentVertices};

// Re-export tool types
pub use tools::{
    export_to_csv, export_to_json, import_from_csv, import_from_json, ExportOptions,
    ImportOptions, ImportStats, ToolError, ToolResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
