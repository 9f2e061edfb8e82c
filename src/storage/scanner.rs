//! Client-side scan cursors
//!
//! `Scanner` walks one key range lazily; `BatchScanner` fetches many ranges
//! in parallel. Both own their position, so concurrent callers never share a
//! cursor, and dropping either releases everything it holds.

use super::error::StorageResult;
use super::key::Key;
use super::{KeyRange, KeyValue, KvStore, SharedStore};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::VecDeque;
use std::sync::Arc;

/// Restricts which records a scan yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    /// Every qualifier of one family
    Family(Vec<u8>),
    /// One exact family and qualifier
    Column { family: Vec<u8>, qualifier: Vec<u8> },
}

impl ColumnFilter {
    pub fn family(family: impl Into<Vec<u8>>) -> Self {
        ColumnFilter::Family(family.into())
    }

    pub fn column(family: impl Into<Vec<u8>>, qualifier: impl Into<Vec<u8>>) -> Self {
        ColumnFilter::Column {
            family: family.into(),
            qualifier: qualifier.into(),
        }
    }

    pub fn matches(&self, key: &Key) -> bool {
        match self {
            ColumnFilter::Family(family) => key.family == *family,
            ColumnFilter::Column { family, qualifier } => {
                key.family == *family && key.qualifier == *qualifier
            }
        }
    }
}

/// A decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Key,
    pub value: Vec<u8>,
}

fn passes(filters: &[ColumnFilter], key: &Key) -> bool {
    filters.is_empty() || filters.iter().any(|f| f.matches(key))
}

/// Raw-key form of `passes` handed to the store
///
/// Undecodable keys are kept so the decode error reaches the caller.
fn raw_passes(filters: &[ColumnFilter], raw: &[u8]) -> bool {
    Key::decode(raw).map_or(true, |key| passes(filters, &key))
}

/// One chunk of `[start, end)`, with the column filters pushed to the store
fn fetch_chunk(
    store: &dyn KvStore,
    table: &str,
    start: &[u8],
    end: Option<&[u8]>,
    limit: usize,
    filters: &[ColumnFilter],
) -> StorageResult<Vec<KeyValue>> {
    if filters.is_empty() {
        store.fetch(table, start, end, limit)
    } else {
        store.fetch_where(table, start, end, limit, &|raw| raw_passes(filters, raw))
    }
}

fn decode_matching(filters: &[ColumnFilter], kv: KeyValue) -> Option<StorageResult<Entry>> {
    match Key::decode(&kv.key) {
        Ok(key) if passes(filters, &key) => Some(Ok(Entry {
            key,
            value: kv.value,
        })),
        Ok(_) => None,
        Err(e) => Some(Err(e)),
    }
}

/// Lazy single-range cursor
///
/// Records are fetched in chunks of `batch_size`. The first chunk is fetched
/// on the first call to `next`; each later chunk re-seeks just past the last
/// key returned, so every chunk sees the store as of its own fetch. Column
/// filters are evaluated by the store while it iterates, so records they
/// reject are never copied into a chunk.
pub struct Scanner {
    store: SharedStore,
    table: String,
    range: KeyRange,
    filters: Vec<ColumnFilter>,
    batch_size: usize,
    buffer: VecDeque<KeyValue>,
    resume_at: Option<Vec<u8>>,
    exhausted: bool,
}

impl Scanner {
    pub fn new(store: SharedStore, table: impl Into<String>, range: KeyRange, batch_size: usize) -> Self {
        Self {
            store,
            table: table.into(),
            range,
            filters: Vec::new(),
            batch_size: batch_size.max(1),
            buffer: VecDeque::new(),
            resume_at: None,
            exhausted: false,
        }
    }

    /// Add a column filter; records matching any filter are returned
    pub fn with_filter(mut self, filter: ColumnFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = ColumnFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn range(&self) -> &KeyRange {
        &self.range
    }

    fn fill(&mut self) -> StorageResult<()> {
        let start = self
            .resume_at
            .take()
            .unwrap_or_else(|| self.range.start.clone());
        let chunk = fetch_chunk(
            self.store.as_ref(),
            &self.table,
            &start,
            self.range.end.as_deref(),
            self.batch_size,
            &self.filters,
        )?;

        if chunk.len() < self.batch_size {
            self.exhausted = true;
        } else if let Some(last) = chunk.last() {
            let mut next = last.key.clone();
            next.push(0);
            self.resume_at = Some(next);
        }
        self.buffer.extend(chunk);
        Ok(())
    }
}

impl Iterator for Scanner {
    type Item = StorageResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(kv) = self.buffer.pop_front() {
                match decode_matching(&self.filters, kv) {
                    Some(item) => return Some(item),
                    None => continue,
                }
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fill() {
                self.exhausted = true;
                return Some(Err(e));
            }
            if self.buffer.is_empty() {
                self.exhausted = true;
                return None;
            }
        }
    }
}

/// Multi-range cursor
///
/// Ranges are fetched in groups, every range of a group in parallel on the
/// query pool. Entries of one range arrive in key order, but there is no
/// ordering between ranges.
pub struct BatchScanner {
    store: SharedStore,
    table: String,
    pending: VecDeque<KeyRange>,
    filters: Vec<ColumnFilter>,
    batch_size: usize,
    group_size: usize,
    pool: Arc<ThreadPool>,
    buffer: VecDeque<KeyValue>,
    failed: bool,
}

impl BatchScanner {
    pub fn new(
        store: SharedStore,
        table: impl Into<String>,
        ranges: Vec<KeyRange>,
        batch_size: usize,
        pool: Arc<ThreadPool>,
    ) -> Self {
        let group_size = pool.current_num_threads().max(1) * 8;
        Self {
            store,
            table: table.into(),
            pending: ranges.into(),
            filters: Vec::new(),
            batch_size: batch_size.max(1),
            group_size,
            pool,
            buffer: VecDeque::new(),
            failed: false,
        }
    }

    pub fn with_filter(mut self, filter: ColumnFilter) -> Self {
        self.filters.push(filter);
        self
    }

    fn fetch_range(&self, range: &KeyRange) -> StorageResult<Vec<KeyValue>> {
        let mut out = Vec::new();
        let mut start = range.start.clone();
        loop {
            let chunk = fetch_chunk(
                self.store.as_ref(),
                &self.table,
                &start,
                range.end.as_deref(),
                self.batch_size,
                &self.filters,
            )?;
            let done = chunk.len() < self.batch_size;
            if let Some(last) = chunk.last() {
                start = last.key.clone();
                start.push(0);
            }
            out.extend(chunk);
            if done {
                return Ok(out);
            }
        }
    }

    fn fill(&mut self) -> StorageResult<()> {
        let take = self.group_size.min(self.pending.len());
        let group: Vec<KeyRange> = self.pending.drain(..take).collect();
        let results: Vec<StorageResult<Vec<KeyValue>>> = self
            .pool
            .install(|| group.par_iter().map(|range| self.fetch_range(range)).collect());
        for result in results {
            self.buffer.extend(result?);
        }
        Ok(())
    }
}

impl Iterator for BatchScanner {
    type Item = StorageResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(kv) = self.buffer.pop_front() {
                match decode_matching(&self.filters, kv) {
                    Some(item) => return Some(item),
                    None => continue,
                }
            }
            if self.failed || self.pending.is_empty() {
                return None;
            }
            if let Err(e) = self.fill() {
                self.failed = true;
                self.buffer.clear();
                return Some(Err(e));
            }
        }
    }
}

/// Everything needed to open cursors on one table
///
/// Cheap to clone; each cursor it opens is independent.
#[derive(Clone)]
pub struct ScanContext {
    store: SharedStore,
    table: String,
    batch_size: usize,
    pool: Arc<ThreadPool>,
}

impl ScanContext {
    pub fn new(store: SharedStore, table: impl Into<String>, batch_size: usize, pool: Arc<ThreadPool>) -> Self {
        Self {
            store,
            table: table.into(),
            batch_size,
            pool,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn scan(&self, range: KeyRange) -> Scanner {
        Scanner::new(self.store.clone(), self.table.clone(), range, self.batch_size)
    }

    pub fn batch_scan(&self, ranges: Vec<KeyRange>) -> BatchScanner {
        BatchScanner::new(
            self.store.clone(),
            self.table.clone(),
            ranges,
            self.batch_size,
            self.pool.clone(),
        )
    }

    /// First record of `range`, if any
    pub fn first(&self, range: &KeyRange) -> StorageResult<Option<Entry>> {
        let mut found = self
            .store
            .fetch(&self.table, &range.start, range.end.as_deref(), 1)?;
        match found.pop() {
            Some(kv) => Ok(Some(Entry {
                key: Key::decode(&kv.key)?,
                value: kv.value,
            })),
            None => Ok(None),
        }
    }

    /// Point read of one record
    pub fn get(&self, key: &Key) -> StorageResult<Option<Vec<u8>>> {
        self.store.get(&self.table, &key.encode())
    }
}

/// Groups a key-ordered entry stream into rows
///
/// Yields each row's bytes with its entries, relying on the stream being
/// ordered so that a row's records are contiguous.
pub struct RowGroups<I: Iterator<Item = StorageResult<Entry>>> {
    inner: std::iter::Peekable<I>,
}

impl<I: Iterator<Item = StorageResult<Entry>>> RowGroups<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner: inner.peekable(),
        }
    }
}

impl<I: Iterator<Item = StorageResult<Entry>>> Iterator for RowGroups<I> {
    type Item = StorageResult<(Vec<u8>, Vec<Entry>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = match self.inner.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let row = first.key.row.clone();
        let mut entries = vec![first];
        while let Some(Ok(next)) = self.inner.peek() {
            if next.key.row != row {
                break;
            }
            if let Some(Ok(entry)) = self.inner.next() {
                entries.push(entry);
            }
        }
        Some(Ok((row, entries)))
    }
}
