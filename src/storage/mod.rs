/// Ordered key-value store abstraction
///
/// The graph layer needs only a handful of primitives from its store:
/// - Table provisioning (exists, create, delete)
/// - Batched point writes and point deletes
/// - Bounded, ordered range fetches, optionally with a key predicate the
///   backend applies while iterating
/// - Sync-on-demand
///
/// Everything else (cursors, multi-range scans, write buffering) is built
/// client-side in `scanner` and `writer` so every backend gets the same
/// semantics.

pub mod error;
pub mod key;
pub mod memory_store;
pub mod rocksdb_store;
pub mod scanner;
pub mod writer;

pub use error::{StorageError, StorageResult};
pub use key::Key;
pub use memory_store::MemoryStore;
pub use rocksdb_store::RocksDbStore;
pub use scanner::{BatchScanner, ColumnFilter, Entry, RowGroups, ScanContext, Scanner};
pub use writer::BatchWriter;

use std::sync::Arc;

/// One raw record returned by a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// One point write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl Mutation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Mutation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Mutation::Delete { key: key.into() }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            Mutation::Put { key, .. } | Mutation::Delete { key } => key,
        }
    }
}

/// Half-open key range `[start, end)`; `end == None` means end of table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Vec<u8>,
    pub end: Option<Vec<u8>>,
}

impl KeyRange {
    pub fn new(start: impl Into<Vec<u8>>, end: Option<Vec<u8>>) -> Self {
        Self {
            start: start.into(),
            end,
        }
    }

    /// Every key of the table
    pub fn all() -> Self {
        Self {
            start: Vec::new(),
            end: None,
        }
    }

    /// Every key starting with `prefix`
    pub fn prefix(prefix: &[u8]) -> Self {
        Self {
            start: prefix.to_vec(),
            end: prefix_successor(prefix),
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && self.end.as_deref().map_or(true, |end| key < end)
    }
}

/// Smallest key greater than every key starting with `prefix`
///
/// Returns `None` when no such key exists (empty or all-`0xFF` prefix).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Ordered key-value store
///
/// Implementations must be safe to share between threads. Tables are
/// independent, lexicographically ordered keyspaces.
pub trait KvStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    fn table_exists(&self, table: &str) -> StorageResult<bool>;

    fn create_table(&self, table: &str) -> StorageResult<()>;

    fn delete_table(&self, table: &str) -> StorageResult<()>;

    /// Apply a batch of mutations as one backend write
    ///
    /// # Returns
    /// * `Err(StorageError::TableNotFound)` if the table is missing
    /// * `Err(StorageError::WriteRejected)` if the backend refuses the batch
    fn apply(&self, table: &str, mutations: &[Mutation]) -> StorageResult<()>;

    /// Fetch at most `limit` records with `start <= key < end`, in key order
    fn fetch(
        &self,
        table: &str,
        start: &[u8],
        end: Option<&[u8]>,
        limit: usize,
    ) -> StorageResult<Vec<KeyValue>>;

    /// Like `fetch`, but only records whose raw key passes `keep` are
    /// returned and count toward `limit`
    ///
    /// Fewer than `limit` records means the range is exhausted. Embedded
    /// backends override this so skipped records are never copied out.
    fn fetch_where(
        &self,
        table: &str,
        start: &[u8],
        end: Option<&[u8]>,
        limit: usize,
        keep: &KeyPredicate<'_>,
    ) -> StorageResult<Vec<KeyValue>> {
        let mut out = Vec::new();
        if limit == 0 {
            return Ok(out);
        }
        let mut start = start.to_vec();
        loop {
            let chunk = self.fetch(table, &start, end, limit)?;
            let done = chunk.len() < limit;
            if let Some(last) = chunk.last() {
                start = last.key.clone();
                start.push(0);
            }
            for kv in chunk {
                if keep(&kv.key) {
                    out.push(kv);
                    if out.len() == limit {
                        return Ok(out);
                    }
                }
            }
            if done {
                return Ok(out);
            }
        }
    }

    /// Make previously applied writes durable
    fn sync(&self, table: &str) -> StorageResult<()>;

    /// Point read
    fn get(&self, table: &str, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let mut end = key.to_vec();
        end.push(0);
        let mut found = self.fetch(table, key, Some(&end), 1)?;
        Ok(found.pop().map(|kv| kv.value))
    }
}

/// Raw-key filter applied inside `KvStore::fetch_where`
pub type KeyPredicate<'a> = dyn Fn(&[u8]) -> bool + Sync + 'a;

/// Store handle shared by the graph, its writers and every open scan
pub type SharedStore = Arc<dyn KvStore>;

pub fn create_table_if_not_exists(store: &dyn KvStore, table: &str) -> StorageResult<()> {
    if !store.table_exists(table)? {
        store.create_table(table)?;
    }
    Ok(())
}

/// Delete a table if present and create it empty
pub fn recreate_table(store: &dyn KvStore, table: &str) -> StorageResult<()> {
    if store.table_exists(table)? {
        store.delete_table(table)?;
    }
    store.create_table(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_successor() {
        assert_eq!(prefix_successor(b"V"), Some(b"W".to_vec()));
        assert_eq!(prefix_successor(b"ab\xFF"), Some(b"ac".to_vec()));
        assert_eq!(prefix_successor(b"\xFF\xFF"), None);
        assert_eq!(prefix_successor(b""), None);
    }

    #[test]
    fn test_key_range_contains() {
        let range = KeyRange::prefix(b"ab");
        assert!(range.contains(b"ab"));
        assert!(range.contains(b"ab\xFF\xFF"));
        assert!(!range.contains(b"ac"));
        assert!(!range.contains(b"aa"));
        assert!(KeyRange::all().contains(b"anything"));
    }

    #[test]
    fn test_default_get_and_table_helpers() {
        let store = MemoryStore::new();
        create_table_if_not_exists(&store, "t").unwrap();
        create_table_if_not_exists(&store, "t").unwrap();
        store
            .apply("t", &[Mutation::put(b"k".to_vec(), b"v".to_vec())])
            .unwrap();
        assert_eq!(store.get("t", b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get("t", b"k\x00").unwrap(), None);

        recreate_table(&store, "t").unwrap();
        assert_eq!(store.get("t", b"k").unwrap(), None);
    }
}
