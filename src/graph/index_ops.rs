//! Key index lifecycle and index-backed lookup
//!
//! Registry changes are synced to the store before the dependent backfill or
//! cleanup starts, so a crash mid-way never leaves a registered key whose
//! registration could still be lost.

use super::edge_ops::edge_filters;
use super::Graph;
use crate::error::{GraphError, GraphResult};
use crate::index::{IndexLookup, KeyIndex};
use crate::layout::{self, family};
use crate::types::{Element, ElementKind, GraphElement, Value};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

impl Graph {
    fn key_index(&self) -> GraphResult<&KeyIndex> {
        self.index.as_ref().ok_or_else(|| {
            GraphError::InvalidArgument("key indexing is disabled: no index table configured".into())
        })
    }

    /// Whether lookups on `key` for `kind` go through the index
    pub fn is_key_indexed(&self, kind: ElementKind, key: &str) -> bool {
        self.index
            .as_ref()
            .map_or(false, |index| index.is_indexed(kind, key))
    }

    pub fn indexed_keys(&self, kind: ElementKind) -> BTreeSet<String> {
        self.index
            .as_ref()
            .map(|index| index.indexed_keys(kind))
            .unwrap_or_default()
    }

    /// Start indexing `key` for elements of `kind`
    ///
    /// No-op if the key is already indexed. Otherwise the key is registered
    /// and synced, any stale entries left in its partition are cleared, and
    /// every element currently holding the key is indexed.
    pub fn create_key_index(&self, key: &str, kind: ElementKind) -> GraphResult<()> {
        validate_index_key(key, kind)?;
        let index = self.key_index()?;
        if index.is_indexed(kind, key) {
            debug!(key, %kind, "key already indexed");
            return Ok(());
        }

        index.register(kind, key)?;
        info!(key, %kind, "registered key index");
        self.rebuild_entries(index, key, kind)
    }

    /// Stop indexing `key` for elements of `kind`
    ///
    /// No-op if the key is not indexed. Entries are removed first, then the
    /// registration is deleted and synced.
    pub fn drop_key_index(&self, key: &str, kind: ElementKind) -> GraphResult<()> {
        let index = self.key_index()?;
        if !index.is_indexed(kind, key) {
            return Ok(());
        }
        index.remove_entries(kind, key)?;
        index.deregister(kind, key)?;
        info!(key, %kind, "dropped key index");
        Ok(())
    }

    /// Rebuild every entry of an indexed key from the element rows
    pub fn reindex_key(&self, key: &str, kind: ElementKind) -> GraphResult<()> {
        let index = self.key_index()?;
        if !index.is_indexed(kind, key) {
            return Err(GraphError::InvalidArgument(format!(
                "key '{}' is not indexed for {}",
                key, kind
            )));
        }
        self.rebuild_entries(index, key, kind)
    }

    fn rebuild_entries(&self, index: &KeyIndex, key: &str, kind: ElementKind) -> GraphResult<()> {
        index.remove_entries(kind, key)?;

        let extra = match kind {
            ElementKind::Vertex => Vec::new(),
            ElementKind::Edge => edge_filters().to_vec(),
        };
        let mut indexed = 0usize;
        for group in self.property_rows(kind, key, &extra)? {
            let (row, entries) = group?;
            let has_existence = entries.iter().any(|e| e.key.family == family::EXISTS);
            let property = entries.iter().find(|e| e.key.family == family::PROPERTY);
            if let (true, Some(property)) = (has_existence, property) {
                let (_, owner) = layout::decode_element_key(&row)?;
                index.add_encoded(kind, &owner, key, &property.value)?;
                indexed += 1;
            }
        }
        index.flush()?;
        info!(key, %kind, indexed, "backfilled key index");
        Ok(())
    }

    /// Index-backed lookup of elements holding `key` (and `value`, if given)
    ///
    /// # Returns
    /// * `Err(GraphError::InvalidArgument)` if `key` is not indexed for `kind`
    pub fn get_elements(
        &self,
        key: &str,
        value: Option<&Value>,
        kind: ElementKind,
    ) -> GraphResult<IndexedElements<'_>> {
        let index = self.key_index()?;
        if !index.is_indexed(kind, key) {
            return Err(GraphError::InvalidArgument(format!(
                "key '{}' is not indexed for {}",
                key, kind
            )));
        }
        Ok(IndexedElements {
            graph: self,
            kind,
            owners: index.lookup(kind, key, value)?,
        })
    }

    /// Add or remove index entries for every indexed key `element` holds
    ///
    /// Called when an element is removed; also usable after bulk loads that
    /// bypassed property writes.
    pub fn add_or_remove_from_index(&self, element: &impl Element, add: bool) -> GraphResult<()> {
        let index = match &self.index {
            Some(index) => index,
            None => return Ok(()),
        };
        let kind = element.kind();
        for key in index.indexed_keys(kind) {
            if let Some(value) = self.get_property(element, &key)? {
                if add {
                    index.add_property_to_index(kind, element.id(), &key, &value)?;
                } else {
                    index.remove_property_from_index(kind, element.id(), &key, &value)?;
                }
            }
        }
        Ok(())
    }
}

fn validate_index_key(key: &str, kind: ElementKind) -> GraphResult<()> {
    if key.is_empty() {
        return Err(GraphError::InvalidArgument("index key cannot be empty".into()));
    }
    if kind.reserved_keys().contains(&key) {
        return Err(GraphError::InvalidArgument(format!(
            "'{}' is reserved and cannot be indexed for {}",
            key, kind
        )));
    }
    Ok(())
}

/// Elements found through the key index
///
/// Every owner is checked against the element rows. Edge entries are
/// resolved to full edge handles, and entries whose element no longer
/// exists are skipped.
pub struct IndexedElements<'g> {
    graph: &'g Graph,
    kind: ElementKind,
    owners: IndexLookup,
}

impl Iterator for IndexedElements<'_> {
    type Item = GraphResult<GraphElement>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let owner = match self.owners.next()? {
                Ok(owner) => owner,
                Err(e) => return Some(Err(e)),
            };
            match self.kind {
                ElementKind::Vertex => match self.graph.get_vertex(owner.as_str()) {
                    Ok(Some(vertex)) => return Some(Ok(vertex.into())),
                    Ok(None) => {
                        warn!(vertex = %owner, "index entry refers to a missing vertex");
                        continue;
                    }
                    Err(e) => return Some(Err(e)),
                },
                ElementKind::Edge => match self.graph.get_edge(owner.as_str()) {
                    Ok(Some(edge)) => return Some(Ok(edge.into())),
                    Ok(None) => {
                        warn!(edge = %owner, "index entry refers to a missing edge");
                        continue;
                    }
                    Err(e) => return Some(Err(e)),
                },
            }
        }
    }
}
