//! Configuration types and loading for the extension registry
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration:
//!
//! ```toml
//! [publish]
//! default_trust_status = "approved"
//!
//! [search]
//! default_limit = 20
//! max_limit = 100
//! default_sort = "featured"
//!
//! [store]
//! snapshot_path = "/var/lib/registry/store.json"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::item::TrustStatus;

/// Largest configuration file accepted by [`load_config`].
pub const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

/// Ordering of search and browse results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Featured first, then most recently modified
    #[default]
    Featured,
    /// Most recently created first
    Newest,
    /// Most recently modified first
    Updated,
    /// Highest install count first
    Popular,
    /// Title, ascending
    Alpha,
}

impl SortOrder {
    /// Parse a caller-supplied sort key, falling back to the default for
    /// anything unrecognized.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "featured" => Ok(SortOrder::Featured),
            "newest" => Ok(SortOrder::Newest),
            "updated" => Ok(SortOrder::Updated),
            "popular" => Ok(SortOrder::Popular),
            "alpha" => Ok(SortOrder::Alpha),
            _ => Err(Error::UnknownSortOrder {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::Featured => "featured",
            SortOrder::Newest => "newest",
            SortOrder::Updated => "updated",
            SortOrder::Popular => "popular",
            SortOrder::Alpha => "alpha",
        };
        f.write_str(name)
    }
}

/// Publish pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Trust status given to items created by a publish
    pub default_trust_status: TrustStatus,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            default_trust_status: TrustStatus::Approved,
        }
    }
}

/// Catalog search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size when the caller gives none
    pub default_limit: usize,
    /// Upper bound on any requested page size
    pub max_limit: usize,
    /// Ordering when the caller gives none
    pub default_sort: SortOrder,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            default_sort: SortOrder::Featured,
        }
    }
}

/// Store settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Where the in-memory store persists its snapshot, if anywhere
    pub snapshot_path: Option<PathBuf>,
}

/// Complete registry configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub publish: PublishConfig,
    pub search: SearchConfig,
    pub store: StoreConfig,
}

impl RegistryConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// - `ConfigNotFound` if the file does not exist
/// - `ConfigTooLarge` if it exceeds [`MAX_CONFIG_SIZE`]
/// - `InvalidConfig` if it is not valid TOML for [`RegistryConfig`]
pub fn load_config(path: &Path) -> Result<RegistryConfig> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let size = fs::metadata(path)?.len();
    if size > MAX_CONFIG_SIZE {
        return Err(Error::ConfigTooLarge {
            path: path.to_path_buf(),
            size,
            max: MAX_CONFIG_SIZE,
        });
    }

    let content = fs::read_to_string(path)?;
    let config = RegistryConfig::from_toml(&content).map_err(|e| Error::InvalidConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    tracing::debug!(?path, "Loaded registry config");
    Ok(config)
}
