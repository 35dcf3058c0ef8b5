//! Search backend selection through the `Registry` facade

use pretty_assertions::assert_eq;
use registry_core::{Registry, Result, SearchBackend, SearchFilters, SearchQuery};
use registry_meta::{Item, SortOrder};
use registry_store::MemoryStore;
use std::sync::{Arc, Mutex};

/// Records which backend path a query took.
#[derive(Default)]
struct RecordingBackend {
    semantic: Option<Vec<String>>,
    fulltext: Option<Vec<String>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    store: Option<MemoryStore>,
}

impl RecordingBackend {
    fn items(&self, slugs: &[String]) -> Vec<Item> {
        let store = self.store.as_ref().expect("backend needs a store");
        slugs
            .iter()
            .map(|s| {
                registry_core::catalog::find_by_slug(store, s)
                    .unwrap()
                    .unwrap()
            })
            .collect()
    }
}

impl SearchBackend for RecordingBackend {
    fn semantic_search(&self, _: &str, _: &SearchFilters, _: usize) -> Result<Option<Vec<Item>>> {
        self.calls.lock().unwrap().push("semantic");
        Ok(self.semantic.as_ref().map(|s| self.items(s)))
    }

    fn fulltext_search(
        &self,
        _: &str,
        _: &SearchFilters,
        _: SortOrder,
        _: usize,
        _: usize,
    ) -> Result<(Vec<Item>, usize)> {
        self.calls.lock().unwrap().push("fulltext");
        match &self.fulltext {
            Some(slugs) => Ok((self.items(slugs), 42)),
            None => Err(registry_core::Error::Search("index offline".into())),
        }
    }
}

fn seeded() -> Registry<MemoryStore> {
    let registry = Registry::new(MemoryStore::new());
    registry.seed_external_tools().unwrap();
    registry.add_tag("gmail", "email").unwrap();
    registry.add_tag("outlook", "email").unwrap();
    registry
}

#[test]
fn test_default_backend_uses_store_scan() {
    let registry = seeded();
    let results = registry
        .search(&SearchQuery::text("google").sorted_by("alpha"))
        .unwrap();

    let slugs: Vec<_> = results.items.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(
        slugs,
        vec![
            "google-calendar",
            "google-docs",
            "google-drive",
            "google-sheets",
            "google-tasks",
        ]
    );
    assert_eq!(results.total, 5);
}

#[test]
fn test_fulltext_total_is_trusted_without_tags() {
    let snapshot = seeded().store().snapshot().unwrap();
    let store = MemoryStore::from_snapshot(snapshot.clone()).unwrap();
    let backend = RecordingBackend {
        fulltext: Some(vec!["gmail".into(), "slack".into()]),
        store: Some(MemoryStore::from_snapshot(snapshot).unwrap()),
        ..RecordingBackend::default()
    };
    let registry = Registry::new(store).with_search_backend(backend);

    let results = registry.search(&SearchQuery::text("mail")).unwrap();
    assert_eq!(results.total, 42);
    assert_eq!(results.items.len(), 2);

    let tagged = registry
        .search(&SearchQuery::text("mail").with_tags("email"))
        .unwrap();
    assert_eq!(tagged.total, 1);
    assert_eq!(tagged.items[0].slug, "gmail");
    assert_eq!(tagged.items[0].tags, vec!["email"]);
}

#[test]
fn test_semantic_answer_skips_fulltext() {
    let snapshot = seeded().store().snapshot().unwrap();
    let store = MemoryStore::from_snapshot(snapshot.clone()).unwrap();
    let calls: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    let backend = RecordingBackend {
        semantic: Some(vec!["outlook".into(), "gmail".into()]),
        store: Some(MemoryStore::from_snapshot(snapshot).unwrap()),
        calls: Arc::clone(&calls),
        ..RecordingBackend::default()
    };
    let registry = Registry::new(store).with_search_backend(backend);

    let results = registry.search(&SearchQuery::text("email")).unwrap();
    let slugs: Vec<_> = results.items.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(slugs, vec!["outlook", "gmail"]);
    assert_eq!(results.total, 2);
    assert_eq!(*calls.lock().unwrap(), vec!["semantic"]);
}

#[test]
fn test_browse_never_calls_backend() {
    let calls: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    let registry = seeded().with_search_backend(RecordingBackend {
        calls: Arc::clone(&calls),
        ..RecordingBackend::default()
    });
    let results = registry
        .search(&SearchQuery::new().with_tags("email").sorted_by("alpha"))
        .unwrap();

    let slugs: Vec<_> = results.items.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(slugs, vec!["gmail", "outlook"]);
    assert!(calls.lock().unwrap().is_empty());
}
