//! The `Registry` facade
//!
//! Bundles a store with its configuration, publisher and search backend so
//! callers address everything by public slug.

use registry_meta::{Item, RegistryConfig, TrustStatus};
use registry_store::{EntityStore, MemoryStore};

use crate::catalog::{self, NewItem};
use crate::dependency::{self, DependencyGraph};
use crate::detail::{self, ItemDetail};
use crate::install::{self, InstallPackage};
use crate::publish::{PublishOutcome, PublishRequest, Publisher};
use crate::search::{self, NoSearchBackend, SearchBackend, SearchQuery, SearchResults};
use crate::seed::{self, SeedReport};
use crate::Result;

/// Extension registry over an entity store.
pub struct Registry<S: EntityStore> {
    store: S,
    config: RegistryConfig,
    publisher: Publisher,
    search_backend: Box<dyn SearchBackend>,
}

impl<S: EntityStore> std::fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

impl<S: EntityStore> Registry<S> {
    /// Registry with default configuration and no search service.
    pub fn new(store: S) -> Self {
        Self::with_config(store, RegistryConfig::default())
    }

    pub fn with_config(store: S, config: RegistryConfig) -> Self {
        let publisher = Publisher::new(&config.publish);
        Self {
            store,
            config,
            publisher,
            search_backend: Box::new(NoSearchBackend),
        }
    }

    pub fn with_search_backend(mut self, backend: impl SearchBackend + 'static) -> Self {
        self.search_backend = Box::new(backend);
        self
    }

    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn create_item(&self, new: NewItem) -> Result<Item> {
        catalog::create_item(&self.store, new)
    }

    pub fn item_by_slug(&self, slug: &str) -> Result<Item> {
        catalog::require_by_slug(&self.store, slug)
    }

    /// Delete an item with its extension and tags.
    pub fn delete_item(&self, slug: &str) -> Result<()> {
        let item = self.item_by_slug(slug)?;
        catalog::delete_item(&self.store, &item.id)?;
        Ok(())
    }

    pub fn set_trust_status(&self, slug: &str, trust_status: TrustStatus) -> Result<Item> {
        let mut item = self.item_by_slug(slug)?;
        item.trust_status = trust_status;
        catalog::save_item(&self.store, &mut item)?;
        tracing::info!(slug, %trust_status, "Changed trust status");
        Ok(item)
    }

    pub fn set_featured(&self, slug: &str, featured: bool) -> Result<Item> {
        let mut item = self.item_by_slug(slug)?;
        item.featured = featured;
        catalog::save_item(&self.store, &mut item)?;
        Ok(item)
    }

    pub fn tags(&self, slug: &str) -> Result<Vec<String>> {
        let item = self.item_by_slug(slug)?;
        catalog::tags_for(&self.store, &item.id)
    }

    pub fn add_tag(&self, slug: &str, tag: &str) -> Result<bool> {
        let item = self.item_by_slug(slug)?;
        catalog::add_tag(&self.store, &item.id, tag)
    }

    pub fn remove_tag(&self, slug: &str, tag: &str) -> Result<bool> {
        let item = self.item_by_slug(slug)?;
        catalog::remove_tag(&self.store, &item.id, tag)
    }

    pub fn get_item_detail(&self, slug: &str) -> Result<ItemDetail> {
        detail::get_item_detail(&self.store, slug)
    }

    pub fn build_install_package(&self, slug: &str) -> Result<InstallPackage> {
        install::build_install_package(&self.store, slug)
    }

    /// Dependency closure of the item with `slug`.
    pub fn collect_dependencies(&self, slug: &str) -> Result<DependencyGraph> {
        let item = self.item_by_slug(slug)?;
        dependency::collect_dependencies(&self.store, &item.id)
    }

    pub fn publish(&self, request: PublishRequest) -> Result<PublishOutcome> {
        self.publisher.publish(&self.store, request)
    }

    pub fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        search::search(
            &self.store,
            self.search_backend.as_ref(),
            &self.config.search,
            query,
        )
    }

    pub fn seed_external_tools(&self) -> Result<SeedReport> {
        seed::seed_external_tools(&self.store)
    }
}

impl Registry<MemoryStore> {
    /// Open an in-memory registry, loading the configured snapshot if any.
    pub fn open(config: RegistryConfig) -> Result<Self> {
        let store = match &config.store.snapshot_path {
            Some(path) => MemoryStore::load_or_create(path)?,
            None => MemoryStore::new(),
        };
        Ok(Self::with_config(store, config))
    }

    /// Write the snapshot. Returns `false` when no snapshot path is configured.
    pub fn persist(&self) -> Result<bool> {
        let Some(path) = &self.config.store.snapshot_path else {
            return Ok(false);
        };
        self.store.save(path)?;
        tracing::info!(path = %path.display(), "Saved registry snapshot");
        Ok(true)
    }
}
