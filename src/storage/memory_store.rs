//! In-memory ordered store
//!
//! A `BTreeMap` per table. Used by tests and by the `memory` backend for
//! throwaway graphs.

use super::error::{StorageError, StorageResult};
use super::{KeyPredicate, KeyValue, KvStore, Mutation};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `apply` fail with `WriteRejected`
    ///
    /// Lets tests exercise failure paths of multi-write operations.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of records in a table
    pub fn len(&self, table: &str) -> StorageResult<usize> {
        self.tables
            .read()
            .get(table)
            .map(BTreeMap::len)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    pub fn is_empty(&self, table: &str) -> StorageResult<bool> {
        self.len(table).map(|n| n == 0)
    }
}

impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn table_exists(&self, table: &str) -> StorageResult<bool> {
        Ok(self.tables.read().contains_key(table))
    }

    fn create_table(&self, table: &str) -> StorageResult<()> {
        self.tables.write().entry(table.to_string()).or_default();
        Ok(())
    }

    fn delete_table(&self, table: &str) -> StorageResult<()> {
        self.tables
            .write()
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    fn apply(&self, table: &str, mutations: &[Mutation]) -> StorageResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected {
                table: table.to_string(),
                reason: "store is rejecting writes".into(),
            });
        }
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        for mutation in mutations {
            match mutation {
                Mutation::Put { key, value } => {
                    data.insert(key.clone(), value.clone());
                }
                Mutation::Delete { key } => {
                    data.remove(key);
                }
            }
        }
        Ok(())
    }

    fn fetch(
        &self,
        table: &str,
        start: &[u8],
        end: Option<&[u8]>,
        limit: usize,
    ) -> StorageResult<Vec<KeyValue>> {
        let tables = self.tables.read();
        let data = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;

        // BTreeMap::range panics on inverted bounds
        if end.map_or(false, |end| end <= start) {
            return Ok(Vec::new());
        }
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        Ok(data
            .range::<[u8], _>((Bound::Included(start), upper))
            .take(limit)
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: v.clone(),
            })
            .collect())
    }

    fn fetch_where(
        &self,
        table: &str,
        start: &[u8],
        end: Option<&[u8]>,
        limit: usize,
        keep: &KeyPredicate<'_>,
    ) -> StorageResult<Vec<KeyValue>> {
        let tables = self.tables.read();
        let data = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        if end.map_or(false, |end| end <= start) {
            return Ok(Vec::new());
        }
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        Ok(data
            .range::<[u8], _>((Bound::Included(start), upper))
            .filter(|(k, _)| keep(k))
            .take(limit)
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: v.clone(),
            })
            .collect())
    }

    fn sync(&self, table: &str) -> StorageResult<()> {
        if self.table_exists(table)? {
            Ok(())
        } else {
            Err(StorageError::TableNotFound(table.to_string()))
        }
    }
}
