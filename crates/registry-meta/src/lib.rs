//! Item model, extension schema and configuration for the extension registry.
//!
//! - [`item`]: catalog items, item types and trust states
//! - [`schema`]: the per-type extension variants and the link edges between them
//! - [`slug`]: public slug derivation and normalization
//! - [`config`]: TOML configuration

pub mod config;
pub mod error;
pub mod item;
pub mod schema;
pub mod slug;

pub use config::{PublishConfig, RegistryConfig, SearchConfig, SortOrder, StoreConfig, load_config};
pub use error::{Error, Result};
pub use item::{Item, ItemType, TrustStatus};
pub use schema::{
    AttributeDefault, ChildLink, DirectLink, Edge, ExtensionVariant, LinkShape, RowAttribute,
    edges, edges_from, edges_into, variant,
};
