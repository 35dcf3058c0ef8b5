//! Error types for registry-core

/// Result type for registry-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the registry core
///
/// Dangling references met while resolving the graph are never reported
/// here: they are skipped and the output degrades instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid required input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown slug or identifier at a required lookup
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the item's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A search backend failed
    #[error("Search backend error: {0}")]
    Search(String),

    /// Store error from registry-store
    #[error(transparent)]
    Store(#[from] registry_store::Error),

    /// Metadata error from registry-meta
    #[error(transparent)]
    Meta(#[from] registry_meta::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
