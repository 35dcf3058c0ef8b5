use std::path::PathBuf;

/// Errors raised by an entity store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A point update targeted a record that does not exist.
    #[error("record '{id}' not found in table '{table}'")]
    RecordNotFound { table: String, id: String },

    /// An insert supplied an identifier that is already taken.
    #[error("duplicate id '{id}' in table '{table}'")]
    DuplicateId { table: String, id: String },

    /// A record carried a malformed bookkeeping field.
    #[error("invalid record in table '{table}': {reason}")]
    InvalidRecord { table: String, reason: String },

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// Snapshot file has an unsupported format version.
    #[error("unsupported snapshot version '{version}' at {path}")]
    UnsupportedSnapshot { path: PathBuf, version: String },

    /// I/O error reading or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error.
    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
