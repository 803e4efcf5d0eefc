//! Model error types.

use thiserror::Error;

/// Errors raised while decoding or encoding subscription documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The document is not valid subscription JSON.
    #[error("invalid subscription document: {0}")]
    Parse(#[source] serde_json::Error),

    /// The document could not be encoded.
    #[error("failed to encode subscription {id}: {source}")]
    Encode {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
