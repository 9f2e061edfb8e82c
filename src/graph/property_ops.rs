//! Property access
//!
//! Every call is a store round-trip; element handles cache nothing.
//! Writes to an indexed key keep the key index in step: the old value's
//! entry is removed before the new value is written and indexed.

use super::Graph;
use crate::error::{GraphError, GraphResult};
use crate::layout::{self, family};
use crate::storage::{ColumnFilter, Key, Mutation};
use crate::types::{Element, Value};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

impl Graph {
    pub fn get_property(&self, element: &impl Element, key: &str) -> GraphResult<Option<Value>> {
        if key.is_empty() {
            return Err(GraphError::InvalidArgument("property key cannot be empty".into()));
        }
        let record = layout::property_key(element.kind(), element.id(), key);
        match self.reader()?.get(&record)? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a property, replacing any previous value
    ///
    /// # Returns
    /// * `Err(GraphError::InvalidArgument)` for an empty or reserved key, or
    ///   an element that no longer exists
    pub fn set_property(
        &self,
        element: &impl Element,
        key: &str,
        value: impl Into<Value>,
    ) -> GraphResult<()> {
        let value = value.into();
        validate_key(element, key)?;
        let encoded = self.codec.encode(&value)?;
        let kind = element.kind();
        if !self.exists(kind, element.id())? {
            return Err(GraphError::InvalidArgument(format!(
                "{} {} does not exist",
                kind,
                element.id()
            )));
        }

        if let Some(index) = self.index.as_ref().filter(|i| i.is_indexed(kind, key)) {
            if let Some(old) = self.get_property(element, key)? {
                index.remove_property_from_index(kind, element.id(), key, &old)?;
            }
        }

        self.writer.add_mutation(Mutation::put(
            layout::property_key(kind, element.id(), key).encode(),
            encoded,
        ))?;

        if let Some(index) = &self.index {
            index.add_property_to_index(kind, element.id(), key, &value)?;
        }
        debug!(element = %element.id(), %kind, key, "set property");
        Ok(())
    }

    /// Set a property from JSON; JSON `null` is rejected
    pub fn set_json_property(
        &self,
        element: &impl Element,
        key: &str,
        value: JsonValue,
    ) -> GraphResult<()> {
        let value = Value::try_from(value)?;
        self.set_property(element, key, value)
    }

    /// Remove a property
    ///
    /// Returns the removed value when the key is indexed or
    /// `return_removed_property_values` is set, otherwise always `None`.
    /// Removing an absent key is not an error.
    pub fn remove_property(&self, element: &impl Element, key: &str) -> GraphResult<Option<Value>> {
        validate_key(element, key)?;
        let kind = element.kind();
        let indexed = self
            .index
            .as_ref()
            .map_or(false, |i| i.is_indexed(kind, key));

        let previous = if indexed || self.config.return_removed_property_values {
            self.get_property(element, key)?
        } else {
            None
        };

        self.writer.add_mutation(Mutation::delete(
            layout::property_key(kind, element.id(), key).encode(),
        ))?;

        if let (Some(index), Some(old)) = (&self.index, &previous) {
            index.remove_property_from_index(kind, element.id(), key, old)?;
        }
        debug!(element = %element.id(), %kind, key, "removed property");
        Ok(previous)
    }

    pub fn property_keys(&self, element: &impl Element) -> GraphResult<BTreeSet<String>> {
        let row = layout::encode_element_key(element.kind(), element.id());
        let mut keys = BTreeSet::new();
        for entry in self.reader()?.scan(Key::column_range(&row, family::PROPERTY)) {
            keys.insert(layout::decode_utf8(&entry?.key.qualifier, "property key")?);
        }
        Ok(keys)
    }

    /// Every property of an element, in one row scan
    pub fn properties(&self, element: &impl Element) -> GraphResult<BTreeMap<String, Value>> {
        let row = layout::encode_element_key(element.kind(), element.id());
        let scanner = self
            .reader()?
            .scan(Key::row_range(&row))
            .with_filter(ColumnFilter::family(family::PROPERTY));
        let mut properties = BTreeMap::new();
        for entry in scanner {
            let entry = entry?;
            let key = layout::decode_utf8(&entry.key.qualifier, "property key")?;
            properties.insert(key, self.codec.decode(&entry.value)?);
        }
        Ok(properties)
    }
}

fn validate_key(element: &impl Element, key: &str) -> GraphResult<()> {
    if key.is_empty() {
        return Err(GraphError::InvalidArgument("property key cannot be empty".into()));
    }
    if element.kind().reserved_keys().contains(&key) {
        return Err(GraphError::InvalidArgument(format!(
            "'{}' is reserved and cannot be used as a {} property key",
            key,
            element.kind()
        )));
    }
    Ok(())
}
