//! Error types for the retrieval engine

use thiserror::Error;

/// Errors that can occur in the retrieval engine
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Malformed query or content text. Caller error, not worth retrying.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The embedding backend could not be reached. Transient; callers may
    /// retry with backoff, the ingestion pipeline skips and reports.
    #[error("embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Internal index invariant violated (e.g. dimension mismatch on
    /// upsert). Fatal for the index instance, never coerced.
    #[error("index corruption: {0}")]
    IndexCorruption(String),

    /// Snapshot serialization error (bincode)
    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an embedding unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(msg.into())
    }

    /// Create an index corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::IndexCorruption(msg.into())
    }
}

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;
