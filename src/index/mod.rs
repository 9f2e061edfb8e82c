//! Key index: secondary index from (property key, value) to element ids
//!
//! Entries live in their own table, partitioned by element kind and
//! property key. Which keys are indexed is recorded in registry rows of the
//! same table and mirrored in memory; the mirror is reloaded after every
//! registry change.
//!
//! Invariant: an entry `(key, value, owner)` exists iff `key` is registered
//! for the owner's kind and the owner currently holds `key = value`. The
//! maintenance calls here are no-ops for unregistered keys, so a key dropped
//! while a property write is in flight does not get fresh entries.

use crate::codec::SharedCodec;
use crate::error::GraphResult;
use crate::layout;
use crate::storage::{
    create_table_if_not_exists, BatchWriter, Mutation, ScanContext, Scanner, SharedStore,
};
use crate::types::{ElementId, ElementKind, Value};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

#[derive(Default)]
struct Registry {
    vertex: HashSet<String>,
    edge: HashSet<String>,
}

impl Registry {
    fn keys(&self, kind: ElementKind) -> &HashSet<String> {
        match kind {
            ElementKind::Vertex => &self.vertex,
            ElementKind::Edge => &self.edge,
        }
    }

    fn keys_mut(&mut self, kind: ElementKind) -> &mut HashSet<String> {
        match kind {
            ElementKind::Vertex => &mut self.vertex,
            ElementKind::Edge => &mut self.edge,
        }
    }
}

pub struct KeyIndex {
    reader: ScanContext,
    writer: BatchWriter,
    codec: SharedCodec,
    registry: RwLock<Registry>,
}

impl KeyIndex {
    /// Open the index table, creating it if needed, and load the registry
    pub fn open(
        store: SharedStore,
        reader: ScanContext,
        writer: BatchWriter,
        codec: SharedCodec,
    ) -> GraphResult<Self> {
        create_table_if_not_exists(store.as_ref(), reader.table())?;
        let index = Self {
            reader,
            writer,
            codec,
            registry: RwLock::new(Registry::default()),
        };
        index.reload()?;
        Ok(index)
    }

    pub fn table(&self) -> &str {
        self.reader.table()
    }

    /// Re-read the registry rows into memory
    pub fn reload(&self) -> GraphResult<()> {
        self.writer.flush()?;
        let mut fresh = Registry::default();
        for kind in ElementKind::ALL {
            for entry in self.reader.scan(layout::registry_range(kind)) {
                let entry = entry?;
                let key = layout::decode_utf8(&entry.key.family, "indexed key")?;
                fresh.keys_mut(kind).insert(key);
            }
        }
        debug!(
            vertex_keys = fresh.vertex.len(),
            edge_keys = fresh.edge.len(),
            "loaded key index registry"
        );
        *self.registry.write() = fresh;
        Ok(())
    }

    pub fn is_indexed(&self, kind: ElementKind, key: &str) -> bool {
        self.registry.read().keys(kind).contains(key)
    }

    pub fn indexed_keys(&self, kind: ElementKind) -> BTreeSet<String> {
        self.registry.read().keys(kind).iter().cloned().collect()
    }

    /// Durably record `key` as indexed for `kind`
    pub fn register(&self, kind: ElementKind, key: &str) -> GraphResult<()> {
        self.writer
            .add_mutation(Mutation::put(layout::registry_key(kind, key).encode(), Vec::new()))?;
        self.writer.sync()?;
        self.reload()
    }

    /// Durably remove `key` from the registry of `kind`
    pub fn deregister(&self, kind: ElementKind, key: &str) -> GraphResult<()> {
        self.writer
            .add_mutation(Mutation::delete(layout::registry_key(kind, key).encode()))?;
        self.writer.sync()?;
        self.reload()
    }

    pub fn add_property_to_index(
        &self,
        kind: ElementKind,
        owner: &ElementId,
        key: &str,
        value: &Value,
    ) -> GraphResult<()> {
        if !self.is_indexed(kind, key) {
            return Ok(());
        }
        let encoded = self.codec.encode(value)?;
        self.add_encoded(kind, owner, key, &encoded)
    }

    pub fn remove_property_from_index(
        &self,
        kind: ElementKind,
        owner: &ElementId,
        key: &str,
        value: &Value,
    ) -> GraphResult<()> {
        if !self.is_indexed(kind, key) {
            return Ok(());
        }
        let encoded = self.codec.encode(value)?;
        let entry = layout::encode_index_key(kind, key, &encoded, owner);
        self.writer.add_mutation(Mutation::delete(entry.encode()))?;
        Ok(())
    }

    /// Add an entry from already-encoded value bytes
    ///
    /// Used by backfill, which reads property values straight from the
    /// graph table without decoding them.
    pub fn add_encoded(
        &self,
        kind: ElementKind,
        owner: &ElementId,
        key: &str,
        encoded_value: &[u8],
    ) -> GraphResult<()> {
        if !self.is_indexed(kind, key) {
            return Ok(());
        }
        let entry = layout::encode_index_key(kind, key, encoded_value, owner);
        self.writer.add_mutation(Mutation::put(entry.encode(), Vec::new()))?;
        Ok(())
    }

    /// Delete every entry of one key partition, registered or not
    pub fn remove_entries(&self, kind: ElementKind, key: &str) -> GraphResult<usize> {
        self.writer.flush()?;
        let mut removed = 0;
        let mut batch = Vec::new();
        for entry in self.reader.scan(layout::index_key_range(kind, key)) {
            batch.push(Mutation::delete(entry?.key.encode()));
            if batch.len() >= 256 {
                removed += batch.len();
                self.writer.add_mutations(batch.drain(..))?;
            }
        }
        removed += batch.len();
        self.writer.add_mutations(batch)?;
        self.writer.flush()?;
        info!(%kind, key, removed, "removed key index entries");
        Ok(removed)
    }

    /// Owners of entries for `key`, optionally restricted to one value
    pub fn lookup(
        &self,
        kind: ElementKind,
        key: &str,
        value: Option<&Value>,
    ) -> GraphResult<IndexLookup> {
        self.writer.flush()?;
        let range = match value {
            Some(value) => layout::index_value_range(kind, key, &self.codec.encode(value)?),
            None => layout::index_key_range(kind, key),
        };
        Ok(IndexLookup {
            scanner: self.reader.scan(range),
        })
    }

    pub fn flush(&self) -> GraphResult<()> {
        Ok(self.writer.flush()?)
    }

    pub fn sync(&self) -> GraphResult<()> {
        Ok(self.writer.sync()?)
    }

    /// Drop buffered writes and the in-memory registry
    pub fn reset(&self) {
        self.writer.discard();
        *self.registry.write() = Registry::default();
    }
}

/// Owner ids from an index range scan
pub struct IndexLookup {
    scanner: Scanner,
}

impl Iterator for IndexLookup {
    type Item = GraphResult<ElementId>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.scanner.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e.into())),
        };
        Some(layout::decode_id(&entry.key.qualifier).map_err(Into::into))
    }
}
