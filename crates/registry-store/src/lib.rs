//! Entity store abstraction for the extension registry.
//!
//! The registry core never talks to a database directly. Every read and write
//! goes through the [`EntityStore`] contract: exact-match point reads,
//! filtered scans, and single-record inserts, updates and deletes over named
//! tables of JSON-shaped [`Record`]s.
//!
//! [`MemoryStore`] is the bundled implementation. It keeps every table in
//! memory and can persist a snapshot to disk.
//!
//! # Example
//!
//! ```
//! use registry_store::{EntityStore, Filter, MemoryStore, Record};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! let mut record = Record::new();
//! record.insert("slug".into(), json!("gmail"));
//! let id = store.insert("item", record).unwrap();
//!
//! let found = store.find("item", &Filter::new().eq("slug", "gmail")).unwrap();
//! assert_eq!(found.unwrap()["id"], json!(id));
//! ```

pub mod error;
pub mod filter;
pub mod memory;
pub mod record;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
pub use filter::{Condition, Filter};
pub use memory::MemoryStore;
pub use record::{CREATED_FIELD, ID_FIELD, MODIFIED_FIELD, Record, record_id};
pub use store::EntityStore;
