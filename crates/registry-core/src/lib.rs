//! Resolution core of the extension registry
//!
//! This crate turns the catalog held in an [`EntityStore`] into the views
//! callers need, and writes publish requests back into it:
//!
//! - **Catalog lifecycle**: items are created together with their paired
//!   extension record and deleted together with it
//! - **Reference resolution**: internal extension ids to public slugs and back
//! - **Dependency resolution**: cycle-safe closure over extension link fields
//! - **Install packages**: slug-addressed bundles in install order
//! - **Item detail**: one item's public view plus the items that use it
//! - **Publishing**: create-or-update of an item and its extension fields
//! - **Search**: catalog browse and query with backend fallbacks
//!
//! # Architecture
//!
//! ```text
//!                     Registry
//!                        |
//!   +---------+---------+--------+---------+--------+
//!   |         |         |        |         |        |
//! detail   install   publish  search     seed    catalog
//!   |         |         |
//!   +----+----+     populate
//!        |              |
//!   dependency     reference
//!        |              |
//!        +--- extension +
//!                |
//!        registry-store / registry-meta
//! ```
//!
//! # Example
//!
//! ```
//! use registry_core::{PublishRequest, Registry};
//! use registry_store::MemoryStore;
//! use serde_json::json;
//!
//! let registry = Registry::new(MemoryStore::new());
//! let outcome = registry
//!     .publish(
//!         PublishRequest::new("Tool", "Gmail")
//!             .with_extension(json!({"tool_name": "gmail"})),
//!     )
//!     .unwrap();
//! assert_eq!(outcome.slug, "gmail");
//!
//! let package = registry.build_install_package("gmail").unwrap();
//! assert_eq!(package.items.len(), 1);
//! ```
//!
//! [`EntityStore`]: registry_store::EntityStore

pub mod catalog;
pub mod dependency;
pub mod detail;
pub mod error;
pub mod extension;
pub mod install;
pub mod logging;
pub mod populate;
pub mod publish;
pub mod reference;
pub mod registry;
pub mod search;
pub mod seed;

pub use catalog::NewItem;
pub use dependency::{DependencyGraph, DependencyNode, collect_dependencies};
pub use detail::{ItemDetail, ItemView};
pub use error::{Error, Result};
pub use install::{InstallPackage, PackageItem};
pub use publish::{
    PublishAction, PublishOutcome, PublishRequest, Publisher, TitleMatcher, UniqueKeyMatcher,
    UpsertMatcher,
};
pub use reference::Reference;
pub use registry::Registry;
pub use search::{
    ItemSummary, NoSearchBackend, SearchBackend, SearchFilters, SearchQuery, SearchResults,
};
pub use seed::SeedReport;
