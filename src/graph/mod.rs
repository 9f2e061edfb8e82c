//! Property graph over an ordered key-value store
//!
//! `Graph` owns one store handle, a buffered writer for the graph table and,
//! when an index table is configured, the key index. Operations are
//! synchronous; enumerations and traversals return lazy iterators that own
//! their cursors, so any number may be open at once and abandoning one
//! mid-way releases it.
//!
//! Before any read the graph flushes its own buffered writes, so a caller
//! always sees what it wrote even with autoflush off.

mod edge_ops;
mod index_ops;
mod property_ops;
mod scan;
mod vertex_ops;

pub use index_ops::IndexedElements;
pub use scan::{EdgeIter, FilteredEdges, FilteredVertices, VertexIter};

use crate::codec::SharedCodec;
use crate::config::{BackendConfig, GraphConfig};
use crate::error::{GraphError, GraphResult};
use crate::index::KeyIndex;
use crate::layout;
use crate::storage::{
    create_table_if_not_exists, recreate_table, BatchWriter, MemoryStore, RocksDbStore,
    ScanContext, SharedStore,
};
use crate::types::{ElementId, ElementKind};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Graph {
    store: SharedStore,
    config: GraphConfig,
    codec: SharedCodec,
    reader: ScanContext,
    writer: BatchWriter,
    index: Option<KeyIndex>,
    closed: bool,
}

impl Graph {
    /// Open the store named by `config.backend` and the graph on it
    pub fn open(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        let store: SharedStore = match &config.backend {
            BackendConfig::RocksDb { path } => Arc::new(RocksDbStore::open(path)?),
            BackendConfig::Memory => Arc::new(MemoryStore::new()),
        };
        Self::with_store(store, config)
    }

    /// Open a graph on an existing store, creating missing tables
    pub fn with_store(store: SharedStore, config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        let codec = config.value_codec()?;
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(config.query_threads)
                .thread_name(|i| format!("kvgraph-query-{}", i))
                .build()
                .map_err(|e| GraphError::Config(format!("cannot start query pool: {}", e)))?,
        );

        create_table_if_not_exists(store.as_ref(), &config.graph_table)?;
        let reader = ScanContext::new(
            store.clone(),
            config.graph_table.clone(),
            config.scan_batch_size,
            pool.clone(),
        );
        let writer = BatchWriter::new(
            store.clone(),
            config.graph_table.clone(),
            config.max_buffered_mutations,
            config.autoflush,
        );
        let index = match &config.index_table {
            Some(table) => Some(Self::open_index(&store, &config, table, &codec, &pool)?),
            None => None,
        };

        info!(
            backend = store.name(),
            graph_table = %config.graph_table,
            index_table = ?config.index_table,
            codec = codec.name(),
            autoflush = config.autoflush,
            "opened graph"
        );

        Ok(Self {
            store,
            config,
            codec,
            reader,
            writer,
            index,
            closed: false,
        })
    }

    fn open_index(
        store: &SharedStore,
        config: &GraphConfig,
        table: &str,
        codec: &SharedCodec,
        pool: &Arc<ThreadPool>,
    ) -> GraphResult<KeyIndex> {
        KeyIndex::open(
            store.clone(),
            ScanContext::new(store.clone(), table, config.scan_batch_size, pool.clone()),
            BatchWriter::new(
                store.clone(),
                table,
                config.max_buffered_mutations,
                config.autoflush,
            ),
            codec.clone(),
        )
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn codec(&self) -> &SharedCodec {
        &self.codec
    }

    /// Apply all buffered writes
    pub fn flush(&self) -> GraphResult<()> {
        self.writer.flush()?;
        if let Some(index) = &self.index {
            index.flush()?;
        }
        Ok(())
    }

    /// Destroy and recreate both tables, dropping every element and index
    pub fn clear(&self) -> GraphResult<()> {
        self.writer.discard();
        recreate_table(self.store.as_ref(), &self.config.graph_table)?;
        if let Some(index) = &self.index {
            index.reset();
            recreate_table(self.store.as_ref(), index.table())?;
            index.reload()?;
        }
        info!(graph_table = %self.config.graph_table, "cleared graph");
        Ok(())
    }

    /// Flush and sync everything, then release the graph
    pub fn shutdown(mut self) -> GraphResult<()> {
        self.closed = true;
        self.writer.sync()?;
        if let Some(index) = &self.index {
            index.sync()?;
        }
        info!(graph_table = %self.config.graph_table, "graph shut down");
        Ok(())
    }

    /// Graph-table cursors, after making buffered writes visible
    pub(crate) fn reader(&self) -> GraphResult<&ScanContext> {
        self.writer.flush()?;
        Ok(&self.reader)
    }

    /// Whether `id` has an existence record as an element of `kind`
    fn exists(&self, kind: ElementKind, id: &ElementId) -> GraphResult<bool> {
        let row = layout::encode_element_key(kind, id);
        let range = crate::storage::Key::column_range(&row, layout::family::EXISTS);
        Ok(self.reader()?.first(&range)?.is_some())
    }

    /// Ids are unique across both kinds
    fn ensure_unused(&self, id: &ElementId) -> GraphResult<()> {
        for kind in ElementKind::ALL {
            if self.exists(kind, id)? {
                return Err(GraphError::DuplicateId(format!("{} ({} exists)", id, kind)));
            }
        }
        Ok(())
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush() {
            warn!(error = %e, "failed to flush graph on drop");
        }
    }
}

/// Parse a caller-supplied id, or generate one
fn resolve_id(id: Option<&str>) -> GraphResult<ElementId> {
    match id {
        Some(id) => Ok(ElementId::new(id)?),
        None => Ok(ElementId::generate()),
    }
}
