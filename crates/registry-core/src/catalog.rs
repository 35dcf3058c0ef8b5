//! Item lifecycle and the tag side table
//!
//! An item and its extension record live and die together: creating an item
//! creates an empty extension of the matching variant and links the two both
//! ways, and deleting an item removes its extension, its extension's child
//! rows and its tag rows.

use registry_meta::schema::{EXTENSION_REF_FIELD, ITEM_TABLE, OWNER_FIELD, TAG_FIELD, TAG_TABLE};
use registry_meta::{Item, ItemType, TrustStatus, slug};
use registry_store::{EntityStore, Filter, ID_FIELD, Record, record_id};
use serde_json::Value;

use crate::extension;
use crate::{Error, Result};

/// Scalar fields for a new catalog item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub title: String,
    pub item_type: ItemType,
    /// Requested slug; derived from the title when `None`
    pub slug: Option<String>,
    pub description: String,
    pub category: Option<String>,
    pub trust_status: TrustStatus,
    pub featured: bool,
    pub visibility: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub source_url: Option<String>,
    pub readme: Option<String>,
    pub image: Option<String>,
}

impl NewItem {
    /// A pending item with only a title and a type.
    pub fn new(title: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            title: title.into(),
            item_type,
            slug: None,
            description: String::new(),
            category: None,
            trust_status: TrustStatus::default(),
            featured: false,
            visibility: None,
            author: None,
            version: None,
            source_url: None,
            readme: None,
            image: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_trust_status(mut self, trust_status: TrustStatus) -> Self {
        self.trust_status = trust_status;
        self
    }

    pub fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    fn into_item(self, slug: String) -> Item {
        Item {
            id: String::new(),
            slug,
            title: self.title,
            description: self.description,
            item_type: self.item_type,
            category: self.category,
            trust_status: self.trust_status,
            featured: self.featured,
            visibility: self.visibility,
            author: self.author,
            version: self.version,
            source_url: self.source_url,
            readme: self.readme,
            install_count: 0,
            image: self.image,
            extension_ref: None,
            created: None,
            modified: None,
        }
    }
}

/// Fetch an item by its internal identifier.
pub fn get_item(store: &dyn EntityStore, id: &str) -> Result<Option<Item>> {
    store
        .get(ITEM_TABLE, id)?
        .map(Item::from_record)
        .transpose()
        .map_err(Error::from)
}

/// Fetch an item for graph traversal.
///
/// A record that no longer decodes as an item, for example one with an
/// unknown `item_type`, is treated as missing.
pub fn lookup_item(store: &dyn EntityStore, id: &str) -> Result<Option<Item>> {
    match get_item(store, id) {
        Err(Error::Meta(registry_meta::Error::MalformedItem(err))) => {
            tracing::debug!(item_id = id, error = %err, "Skipping undecodable item record");
            Ok(None)
        }
        other => other,
    }
}

/// First item matching `filter`.
pub fn find_item(store: &dyn EntityStore, filter: &Filter) -> Result<Option<Item>> {
    store
        .find(ITEM_TABLE, filter)?
        .map(Item::from_record)
        .transpose()
        .map_err(Error::from)
}

/// Every item matching `filter`, in insertion order.
pub fn list_items(store: &dyn EntityStore, filter: &Filter) -> Result<Vec<Item>> {
    store
        .list(ITEM_TABLE, filter)?
        .into_iter()
        .map(|record| Item::from_record(record).map_err(Error::from))
        .collect()
}

pub fn find_by_slug(store: &dyn EntityStore, slug: &str) -> Result<Option<Item>> {
    find_item(store, &Filter::new().eq("slug", slug))
}

/// Resolve a public slug to its item.
///
/// # Errors
///
/// - `Validation` for an empty slug
/// - `NotFound` when no item carries the slug
pub fn require_by_slug(store: &dyn EntityStore, slug: &str) -> Result<Item> {
    if slug.is_empty() {
        return Err(Error::Validation("slug is required".to_string()));
    }
    find_by_slug(store, slug)?
        .ok_or_else(|| Error::NotFound(format!("Registry item with slug '{slug}' not found")))
}

/// Compute the slug an item will be stored under.
///
/// A requested slug is normalized; otherwise one is derived from the title.
/// Collisions with *other* items get a `-2`, `-3`, ... suffix; `own_id`
/// excludes the item being saved from the check.
pub fn resolve_slug(
    store: &dyn EntityStore,
    requested: Option<&str>,
    title: &str,
    own_id: Option<&str>,
) -> Result<String> {
    let base = match requested.filter(|s| !s.trim().is_empty()) {
        Some(requested) => slug::normalize(requested),
        None => slug::normalize(&slug::generate(title)),
    };
    if base.is_empty() {
        return Err(Error::Validation(format!(
            "cannot derive a slug from '{}'",
            requested.unwrap_or(title)
        )));
    }

    slug::make_unique(&base, |candidate| -> Result<bool> {
        let mut filter = Filter::new().eq("slug", candidate);
        if let Some(id) = own_id {
            filter = filter.ne(ID_FIELD, id);
        }
        Ok(store.exists(ITEM_TABLE, &filter)?)
    })
}

/// Create an item together with its empty extension record.
pub fn create_item(store: &dyn EntityStore, new: NewItem) -> Result<Item> {
    let slug = resolve_slug(store, new.slug.as_deref(), &new.title, None)?;
    let item_type = new.item_type;
    let record = new.into_item(slug).to_record()?;

    let id = store.insert(ITEM_TABLE, record)?;
    if let Err(err) = attach_extension(store, item_type, &id) {
        tracing::warn!(item_id = %id, error = %err, "Rolling back item without extension");
        store.delete(ITEM_TABLE, &id)?;
        return Err(err);
    }

    let item = get_item(store, &id)?
        .ok_or_else(|| Error::NotFound(format!("Registry item '{id}' vanished after insert")))?;
    tracing::info!(slug = %item.slug, item_type = %item_type, "Created registry item");
    Ok(item)
}

/// Create the empty extension for a freshly inserted item and link it back.
///
/// On failure nothing of the extension is left behind.
fn attach_extension(store: &dyn EntityStore, item_type: ItemType, item_id: &str) -> Result<()> {
    let extension_id = extension::create_empty(store, item_type, item_id)?;

    let mut link = Record::new();
    link.insert(
        EXTENSION_REF_FIELD.to_string(),
        Value::String(extension_id.clone()),
    );
    if let Err(err) = store.update(ITEM_TABLE, item_id, link) {
        extension::delete(store, item_type, &extension_id)?;
        return Err(err.into());
    }
    Ok(())
}

/// Persist an item's mutable fields, re-applying the slug rules.
///
/// `item.slug` is updated in place to the value actually stored.
pub fn save_item(store: &dyn EntityStore, item: &mut Item) -> Result<()> {
    item.slug = resolve_slug(store, Some(&item.slug), &item.title, Some(&item.id))?;
    store.update(ITEM_TABLE, &item.id, item.to_record()?)?;
    Ok(())
}

/// Delete an item with its extension and tags. Returns whether it existed.
pub fn delete_item(store: &dyn EntityStore, id: &str) -> Result<bool> {
    let Some(item) = get_item(store, id)? else {
        return Ok(false);
    };

    if let Some(extension_id) = &item.extension_ref {
        extension::delete(store, item.item_type, extension_id)?;
    }
    for row in store.list(TAG_TABLE, &Filter::new().eq(OWNER_FIELD, id))? {
        if let Some(row_id) = record_id(&row) {
            store.delete(TAG_TABLE, row_id)?;
        }
    }
    let removed = store.delete(ITEM_TABLE, id)?;

    tracing::info!(slug = %item.slug, "Deleted registry item");
    Ok(removed)
}

/// Tags attached to an item, in the order they were added.
pub fn tags_for(store: &dyn EntityStore, id: &str) -> Result<Vec<String>> {
    Ok(store
        .list(TAG_TABLE, &Filter::new().eq(OWNER_FIELD, id))?
        .into_iter()
        .filter_map(|row| row.get(TAG_FIELD).and_then(Value::as_str).map(str::to_string))
        .collect())
}

/// Attach a tag. Returns `false` when the item already carries it.
pub fn add_tag(store: &dyn EntityStore, id: &str, tag: &str) -> Result<bool> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(Error::Validation("tag cannot be empty".to_string()));
    }

    let filter = Filter::new().eq(OWNER_FIELD, id).eq(TAG_FIELD, tag);
    if store.exists(TAG_TABLE, &filter)? {
        return Ok(false);
    }

    let mut row = Record::new();
    row.insert(OWNER_FIELD.to_string(), Value::String(id.to_string()));
    row.insert(TAG_FIELD.to_string(), Value::String(tag.to_string()));
    store.insert(TAG_TABLE, row)?;
    Ok(true)
}

/// Detach a tag. Returns whether a row was removed.
pub fn remove_tag(store: &dyn EntityStore, id: &str, tag: &str) -> Result<bool> {
    let filter = Filter::new().eq(OWNER_FIELD, id).eq(TAG_FIELD, tag.trim());
    let mut removed = false;
    for row in store.list(TAG_TABLE, &filter)? {
        if let Some(row_id) = record_id(&row) {
            removed |= store.delete(TAG_TABLE, row_id)?;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_meta::schema::variant;
    use registry_store::MemoryStore;

    #[test]
    fn test_create_item_pairs_extension_both_ways() {
        let store = MemoryStore::new();
        let item = create_item(&store, NewItem::new("Gmail", ItemType::Tool)).unwrap();

        assert_eq!(item.slug, "gmail");
        let extension_id = item.extension_ref.clone().expect("extension_ref set");
        let owner = store
            .get_field(variant(ItemType::Tool).table(), &extension_id, OWNER_FIELD)
            .unwrap();
        assert_eq!(owner, Some(Value::String(item.id.clone())));
    }

    #[test]
    fn test_slug_collision_appends_counter() {
        let store = MemoryStore::new();
        let first = create_item(&store, NewItem::new("My Tool", ItemType::Tool)).unwrap();
        let second = create_item(&store, NewItem::new("My Tool", ItemType::Tool)).unwrap();
        let third = create_item(&store, NewItem::new("My Tool", ItemType::Skill)).unwrap();

        assert_eq!(first.slug, "my-tool");
        assert_eq!(second.slug, "my-tool-2");
        assert_eq!(third.slug, "my-tool-3");
    }

    #[test]
    fn test_requested_slug_is_normalized() {
        let store = MemoryStore::new();
        let item = create_item(
            &store,
            NewItem::new("Whatever", ItemType::Ui).with_slug("Fancy_UI Panel"),
        )
        .unwrap();
        assert_eq!(item.slug, "fancy-ui-panel");
    }

    #[test]
    fn test_unsluggable_title_is_rejected() {
        let store = MemoryStore::new();
        let err = create_item(&store, NewItem::new("???", ItemType::Tool)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_resaving_keeps_own_slug() {
        let store = MemoryStore::new();
        let mut item = create_item(&store, NewItem::new("Slack", ItemType::Tool)).unwrap();
        item.description = "chat".into();
        save_item(&store, &mut item).unwrap();

        assert_eq!(item.slug, "slack");
        let stored = get_item(&store, &item.id).unwrap().unwrap();
        assert_eq!(stored.description, "chat");
        assert_eq!(stored.extension_ref, item.extension_ref);
    }

    #[test]
    fn test_renaming_slug_onto_another_item_gets_suffix() {
        let store = MemoryStore::new();
        create_item(&store, NewItem::new("Slack", ItemType::Tool)).unwrap();
        let mut other = create_item(&store, NewItem::new("Discord", ItemType::Tool)).unwrap();

        other.slug = "slack".into();
        save_item(&store, &mut other).unwrap();
        assert_eq!(other.slug, "slack-2");
    }

    #[test]
    fn test_delete_cascades_extension_and_tags() {
        let store = MemoryStore::new();
        let item = create_item(&store, NewItem::new("Gmail", ItemType::Tool)).unwrap();
        add_tag(&store, &item.id, "email").unwrap();
        let extension_id = item.extension_ref.clone().unwrap();

        assert!(delete_item(&store, &item.id).unwrap());
        assert!(get_item(&store, &item.id).unwrap().is_none());
        assert!(
            store
                .get(variant(ItemType::Tool).table(), &extension_id)
                .unwrap()
                .is_none()
        );
        assert!(tags_for(&store, &item.id).unwrap().is_empty());
        assert!(!delete_item(&store, &item.id).unwrap());
    }

    #[test]
    fn test_tags_are_unique_per_item() {
        let store = MemoryStore::new();
        let item = create_item(&store, NewItem::new("Gmail", ItemType::Tool)).unwrap();

        assert!(add_tag(&store, &item.id, "email").unwrap());
        assert!(!add_tag(&store, &item.id, " email ").unwrap());
        assert!(add_tag(&store, &item.id, "google").unwrap());
        assert_eq!(tags_for(&store, &item.id).unwrap(), vec!["email", "google"]);

        assert!(remove_tag(&store, &item.id, "email").unwrap());
        assert!(!remove_tag(&store, &item.id, "email").unwrap());
        assert_eq!(tags_for(&store, &item.id).unwrap(), vec!["google"]);
        assert!(matches!(
            add_tag(&store, &item.id, "  "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_require_by_slug_errors() {
        let store = MemoryStore::new();
        assert!(matches!(
            require_by_slug(&store, ""),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            require_by_slug(&store, "ghost"),
            Err(Error::NotFound(_))
        ));
    }

    /// Store that rejects inserts into one table.
    struct RejectingStore {
        inner: MemoryStore,
        reject: &'static str,
    }

    impl EntityStore for RejectingStore {
        fn get(&self, table: &str, id: &str) -> registry_store::Result<Option<Record>> {
            self.inner.get(table, id)
        }

        fn list(&self, table: &str, filter: &Filter) -> registry_store::Result<Vec<Record>> {
            self.inner.list(table, filter)
        }

        fn insert(&self, table: &str, record: Record) -> registry_store::Result<String> {
            if table == self.reject {
                return Err(registry_store::Error::InvalidRecord {
                    table: table.to_string(),
                    reason: "rejected".to_string(),
                });
            }
            self.inner.insert(table, record)
        }

        fn update(&self, table: &str, id: &str, fields: Record) -> registry_store::Result<()> {
            self.inner.update(table, id, fields)
        }

        fn delete(&self, table: &str, id: &str) -> registry_store::Result<bool> {
            self.inner.delete(table, id)
        }
    }

    #[test]
    fn test_failed_extension_insert_rolls_back_item() {
        let store = RejectingStore {
            inner: MemoryStore::new(),
            reject: variant(ItemType::Tool).table(),
        };

        let result = create_item(&store, NewItem::new("Gmail", ItemType::Tool));
        assert!(matches!(result, Err(Error::Store(_))));
        assert_eq!(store.count(ITEM_TABLE, &Filter::new()).unwrap(), 0);

        // Other variants are unaffected and the slug is still free
        let skill = create_item(&store, NewItem::new("Gmail", ItemType::Skill)).unwrap();
        assert_eq!(skill.slug, "gmail");
    }

    #[test]
    fn test_lookup_item_skips_undecodable_records() {
        let store = MemoryStore::new();
        let mut record = Record::new();
        record.insert("slug".into(), Value::String("odd".into()));
        record.insert("title".into(), Value::String("Odd".into()));
        record.insert("item_type".into(), Value::String("Widget".into()));
        let id = store.insert(ITEM_TABLE, record).unwrap();

        assert!(matches!(get_item(&store, &id), Err(Error::Meta(_))));
        assert!(lookup_item(&store, &id).unwrap().is_none());
    }
}
