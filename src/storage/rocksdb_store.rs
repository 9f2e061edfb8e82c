/// RocksDB storage implementation
///
/// Each table is a column family of one database:
/// - `graph` table:       element rows (existence, adjacency, endpoints, properties)
/// - `graph_index` table: key index entries and the index registry
///
/// Keys are stored exactly as produced by the graph layer, so the column
/// family's bytewise comparator gives the required key order.

use super::error::{StorageError, StorageResult};
use super::{KeyPredicate, KeyValue, KvStore, Mutation};
use rocksdb::{
    BoundColumnFamily, DBWithThreadMode, Direction as ScanDirection, IteratorMode,
    MultiThreaded, Options, ReadOptions, WriteBatch,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed ordered store
pub struct RocksDbStore {
    /// RocksDB database instance
    db: Db,

    /// Database directory
    path: PathBuf,
}

impl RocksDbStore {
    /// Open (or create) a database
    ///
    /// # Arguments
    /// * `path` - Path to the database directory
    ///
    /// Existing column families are reopened, so tables survive restarts.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let opts = Self::db_options();

        // list_cf fails on a fresh directory; start with only the default family
        let families = Db::list_cf(&opts, &path).unwrap_or_else(|_| vec!["default".to_string()]);
        let db = Db::open_cf(&opts, &path, &families)?;

        info!(path = %path.display(), tables = families.len(), "opened RocksDB store");
        Ok(Self { db, path })
    }

    fn db_options() -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table(&self, table: &str) -> StorageResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }
}

impl KvStore for RocksDbStore {
    fn name(&self) -> &str {
        "rocksdb"
    }

    fn table_exists(&self, table: &str) -> StorageResult<bool> {
        Ok(self.db.cf_handle(table).is_some())
    }

    fn create_table(&self, table: &str) -> StorageResult<()> {
        debug!(table, "creating column family");
        self.db.create_cf(table, &Options::default())?;
        Ok(())
    }

    fn delete_table(&self, table: &str) -> StorageResult<()> {
        if !self.table_exists(table)? {
            return Err(StorageError::TableNotFound(table.to_string()));
        }
        debug!(table, "dropping column family");
        self.db.drop_cf(table)?;
        Ok(())
    }

    fn apply(&self, table: &str, mutations: &[Mutation]) -> StorageResult<()> {
        let cf = self.table(table)?;
        let mut batch = WriteBatch::default();
        for mutation in mutations {
            match mutation {
                Mutation::Put { key, value } => batch.put_cf(&cf, key, value),
                Mutation::Delete { key } => batch.delete_cf(&cf, key),
            }
        }
        self.db
            .write(batch)
            .map_err(|e| StorageError::WriteRejected {
                table: table.to_string(),
                reason: e.to_string(),
            })
    }

    fn fetch(
        &self,
        table: &str,
        start: &[u8],
        end: Option<&[u8]>,
        limit: usize,
    ) -> StorageResult<Vec<KeyValue>> {
        self.fetch_where(table, start, end, limit, &|_| true)
    }

    fn fetch_where(
        &self,
        table: &str,
        start: &[u8],
        end: Option<&[u8]>,
        limit: usize,
        keep: &KeyPredicate<'_>,
    ) -> StorageResult<Vec<KeyValue>> {
        let cf = self.table(table)?;
        if limit == 0 || end.map_or(false, |end| end <= start) {
            return Ok(Vec::new());
        }

        let mut read_opts = ReadOptions::default();
        if let Some(end) = end {
            read_opts.set_iterate_upper_bound(end.to_vec());
        }

        let iter = self.db.iterator_cf_opt(
            &cf,
            read_opts,
            IteratorMode::From(start, ScanDirection::Forward),
        );

        let mut out = Vec::with_capacity(limit.min(1024));
        for item in iter {
            let (key, value) = item?;
            if !keep(&key) {
                continue;
            }
            out.push(KeyValue {
                key: key.to_vec(),
                value: value.to_vec(),
            });
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    fn sync(&self, table: &str) -> StorageResult<()> {
        let cf = self.table(table)?;
        self.db.flush_cf(&cf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tables_and_ordered_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksDbStore::open(temp_dir.path()).unwrap();

        assert!(!store.table_exists("t").unwrap());
        store.create_table("t").unwrap();
        assert!(store.table_exists("t").unwrap());

        store
            .apply(
                "t",
                &[
                    Mutation::put(b"b".to_vec(), b"2".to_vec()),
                    Mutation::put(b"a".to_vec(), b"1".to_vec()),
                    Mutation::put(b"c".to_vec(), b"3".to_vec()),
                    Mutation::delete(b"c".to_vec()),
                ],
            )
            .unwrap();

        let all = store.fetch("t", b"", None, 10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].key, b"a");

        let bounded = store.fetch("t", b"a", Some(b"b"), 10).unwrap();
        assert_eq!(bounded.len(), 1);
        assert_eq!(store.fetch("t", b"", None, 1).unwrap().len(), 1);

        store.sync("t").unwrap();
        store.delete_table("t").unwrap();
        assert!(!store.table_exists("t").unwrap());
    }

    #[test]
    fn test_fetch_where_skips_inside_iterator() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksDbStore::open(temp_dir.path()).unwrap();
        store.create_table("t").unwrap();
        let mutations: Vec<Mutation> = (0..10u8)
            .map(|i| Mutation::put(vec![b'k', i], vec![i]))
            .collect();
        store.apply("t", &mutations).unwrap();

        let even = |key: &[u8]| key[1] % 2 == 0;
        let first = store.fetch_where("t", b"", None, 3, &even).unwrap();
        let values: Vec<u8> = first.iter().map(|kv| kv.value[0]).collect();
        assert_eq!(values, vec![0, 2, 4]);

        let rest = store.fetch_where("t", &[b'k', 5], None, 10, &even).unwrap();
        assert_eq!(rest.len(), 2);
        assert!(store.fetch_where("t", b"", None, 0, &even).unwrap().is_empty());
    }

    #[test]
    fn test_tables_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = RocksDbStore::open(temp_dir.path()).unwrap();
            store.create_table("graph").unwrap();
            store
                .apply("graph", &[Mutation::put(b"k".to_vec(), b"v".to_vec())])
                .unwrap();
            store.sync("graph").unwrap();
        }

        let store = RocksDbStore::open(temp_dir.path()).unwrap();
        assert!(store.table_exists("graph").unwrap());
        assert_eq!(store.get("graph", b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_missing_table_errors() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksDbStore::open(temp_dir.path()).unwrap();
        assert!(matches!(
            store.fetch("missing", b"", None, 1),
            Err(StorageError::TableNotFound(_))
        ));
        assert!(store.delete_table("missing").is_err());
    }
}
