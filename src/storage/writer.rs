//! Buffered mutation writer

use super::error::StorageResult;
use super::{KvStore, Mutation, SharedStore};
use parking_lot::Mutex;
use tracing::debug;

/// Buffers mutations for one table
///
/// The buffer is applied when it reaches `max_buffered`, on `flush`, and
/// after every call when `autoflush` is on. A failed apply drops the batch
/// that was in flight; nothing is retried or rolled back.
pub struct BatchWriter {
    store: SharedStore,
    table: String,
    buffer: Mutex<Vec<Mutation>>,
    max_buffered: usize,
    autoflush: bool,
}

impl BatchWriter {
    pub fn new(store: SharedStore, table: impl Into<String>, max_buffered: usize, autoflush: bool) -> Self {
        Self {
            store,
            table: table.into(),
            buffer: Mutex::new(Vec::new()),
            max_buffered: max_buffered.max(1),
            autoflush,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn autoflush(&self) -> bool {
        self.autoflush
    }

    pub fn add_mutation(&self, mutation: Mutation) -> StorageResult<()> {
        self.add_mutations(std::iter::once(mutation))
    }

    /// Buffer several mutations; with autoflush they are applied as one batch
    pub fn add_mutations(&self, mutations: impl IntoIterator<Item = Mutation>) -> StorageResult<()> {
        let mut buffer = self.buffer.lock();
        for mutation in mutations {
            buffer.push(mutation);
            if buffer.len() >= self.max_buffered {
                self.apply_locked(&mut buffer)?;
            }
        }
        if self.autoflush {
            self.apply_locked(&mut buffer)?;
        }
        Ok(())
    }

    /// Apply everything buffered so far
    pub fn flush(&self) -> StorageResult<()> {
        let mut buffer = self.buffer.lock();
        self.apply_locked(&mut buffer)
    }

    /// Flush, then ask the store to make the table durable
    pub fn sync(&self) -> StorageResult<()> {
        self.flush()?;
        self.store.sync(&self.table)
    }

    /// Number of mutations waiting to be applied
    pub fn pending(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Drop buffered mutations without applying them
    pub fn discard(&self) -> usize {
        let mut buffer = self.buffer.lock();
        let dropped = buffer.len();
        buffer.clear();
        dropped
    }

    fn apply_locked(&self, buffer: &mut Vec<Mutation>) -> StorageResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(buffer);
        debug!(table = %self.table, mutations = batch.len(), "applying mutation batch");
        self.store.apply(&self.table, &batch)
    }
}
