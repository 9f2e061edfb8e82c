//! Error types for graph operations

use crate::codec::CodecError;
use crate::storage::StorageError;
use crate::types::{ElementIdError, ValueError};
use thiserror::Error;

/// Graph operation errors
///
/// Absence of a vertex, edge or property is not an error: lookups return
/// `Ok(None)`. Multi-write operations have no rollback, so an error returned
/// partway through leaves the writes that already succeeded in place.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Null, empty or otherwise unusable caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Element creation with an id that is already taken
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// Stored records disagree with each other
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ElementIdError> for GraphError {
    fn from(err: ElementIdError) -> Self {
        GraphError::InvalidArgument(err.to_string())
    }
}

impl From<ValueError> for GraphError {
    fn from(err: ValueError) -> Self {
        GraphError::InvalidArgument(err.to_string())
    }
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_map_to_invalid_argument() {
        let err: GraphError = ElementIdError::Empty.into();
        assert!(matches!(err, GraphError::InvalidArgument(_)));

        let err: GraphError = ValueError::Null.into();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
    }

    #[test]
    fn test_storage_error_wraps() {
        let err: GraphError = StorageError::TableNotFound("graph".into()).into();
        assert_eq!(err.to_string(), "Storage error: Table not found: graph");
    }
}
