//! Error types for registry-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid item_type: {value}")]
    UnknownItemType { value: String },

    #[error("Invalid trust_status: {value}")]
    UnknownTrustStatus { value: String },

    #[error("Invalid sort order: {value}")]
    UnknownSortOrder { value: String },

    #[error("Malformed item record: {0}")]
    MalformedItem(#[from] serde_json::Error),

    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Config file too large: {path} is {size} bytes (max {max})")]
    ConfigTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
