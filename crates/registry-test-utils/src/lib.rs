//! Shared test fixtures for the extension registry.
//!
//! Dev-dependency only, never published.
//!
//! - [`catalog`]: [`TestCatalog`] builder publishing items through the real pipeline
//! - [`records`]: raw store writes for shapes the pipeline cannot produce
//!   (items without extensions, rewired owners, cycles)

pub mod catalog;
pub mod records;

pub use catalog::TestCatalog;
