//! Error types for storage operations

use thiserror::Error;

/// Storage operation errors
///
/// Every variant is fatal for the operation in flight. The graph layer never
/// retries; retry policy belongs to the store client.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Store cannot service the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Store refused a batch of mutations
    #[error("Write rejected for table {table}: {reason}")]
    WriteRejected { table: String, reason: String },

    /// A stored key or value could not be interpreted
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
