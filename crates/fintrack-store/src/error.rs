//! Error types for the store layer.
//!
//! The taxonomy is deliberately small. Transport failures and configuration
//! failures collapse into a single [`StoreError::Unavailable`] signal so that
//! callers cannot (and do not need to) distinguish them. A read of a key that
//! was never written is *not* an error; it is represented as `Option::None`
//! by the operations that can observe it.

/// Result alias used throughout the store layer.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing transport is unreachable or misconfigured.
    ///
    /// Always retryable by a caller at a higher layer. This layer never
    /// retries internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A value could not be serialized or deserialized.
    ///
    /// Fatal for the affected operation; the value is never silently
    /// dropped or stored in a corrupt form.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<fred::error::Error> for StoreError {
    fn from(err: fred::error::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}
