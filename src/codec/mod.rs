//! Byte encodings used by the graph layer
//!
//! - `component`: order-preserving tuple encoding for store keys
//! - `ValueCodec`: pluggable property value serialization, with a compact
//!   tagged binary codec as the default and a JSON codec as an alternative
//!
//! Codecs must be deterministic: the key index stores encoded values inside
//! keys and finds them again by exact byte match.

pub mod binary;
pub mod component;
pub mod json;

pub use binary::BinaryCodec;
pub use json::JsonCodec;

use crate::types::Value;
use std::sync::Arc;
use thiserror::Error;

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Property value serialization
pub trait ValueCodec: Send + Sync {
    /// Short name used in configuration and logs
    fn name(&self) -> &'static str;

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value>;
}

pub type SharedCodec = Arc<dyn ValueCodec>;

/// Look up a built-in codec by name
pub fn codec_by_name(name: &str) -> Option<SharedCodec> {
    match name {
        "binary" => Some(Arc::new(BinaryCodec)),
        "json" => Some(Arc::new(JsonCodec)),
        _ => None,
    }
}
