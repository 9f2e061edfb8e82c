use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error types for ElementId construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementIdError {
    #[error("Element id cannot be empty")]
    Empty,
}

/// ElementId: opaque, globally unique identifier for vertices and edges
///
/// Ids are plain strings compared by raw value. Callers may supply their own
/// id; otherwise a random UUID (v4) is generated. Ids are immutable once
/// assigned and ordered byte-wise, which is also the order they take in the
/// underlying store.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create an ElementId from a caller-supplied string
    ///
    /// # Returns
    /// * `Ok(ElementId)` for any non-empty string
    /// * `Err(ElementIdError::Empty)` for the empty string
    pub fn new(id: impl Into<String>) -> Result<Self, ElementIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ElementIdError::Empty);
        }
        Ok(Self(id))
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw id bytes as stored in row keys and qualifiers
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ElementId {
    type Err = ElementIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ElementId {
    type Error = ElementIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ElementId {
    type Error = ElementIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ElementId> for String {
    fn from(id: ElementId) -> String {
        id.0
    }
}
