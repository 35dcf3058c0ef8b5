//! Translation between internal extension ids and public item references
//!
//! Extensions link to each other by internal id. Callers only ever see item
//! slugs, so every outward view goes through [`to_reference`] or [`to_slug`],
//! and every inward slug goes through [`from_slug`].
//!
//! Dangling links are expected: an item can be deleted while other
//! extensions still point at its extension. Every lookup here therefore
//! answers `None` rather than failing when a hop is missing.

use registry_meta::schema::{OWNER_FIELD, variant};
use registry_meta::{Item, ItemType};
use registry_store::EntityStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, catalog};

/// Public pointer to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub slug: String,
    pub title: String,
    pub item_type: ItemType,
}

impl From<&Item> for Reference {
    fn from(item: &Item) -> Self {
        Self {
            slug: item.slug.clone(),
            title: item.title.clone(),
            item_type: item.item_type,
        }
    }
}

/// Owning item id of an extension.
pub fn owner_of(
    store: &dyn EntityStore,
    extension_type: ItemType,
    extension_id: &str,
) -> Result<Option<String>> {
    if extension_id.is_empty() {
        return Ok(None);
    }
    let owner = store.get_field(variant(extension_type).table(), extension_id, OWNER_FIELD)?;
    Ok(owner
        .and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }))
}

/// Item owning an extension, if both hops resolve.
pub fn owner_item(
    store: &dyn EntityStore,
    extension_type: ItemType,
    extension_id: &str,
) -> Result<Option<Item>> {
    match owner_of(store, extension_type, extension_id)? {
        Some(item_id) => catalog::lookup_item(store, &item_id),
        None => Ok(None),
    }
}

/// Public reference for an extension.
pub fn to_reference(
    store: &dyn EntityStore,
    extension_type: ItemType,
    extension_id: &str,
) -> Result<Option<Reference>> {
    let reference = owner_item(store, extension_type, extension_id)?.map(|item| Reference::from(&item));
    if reference.is_none() {
        tracing::debug!(%extension_type, extension_id, "Extension reference does not resolve");
    }
    Ok(reference)
}

/// Public slug for an extension.
pub fn to_slug(
    store: &dyn EntityStore,
    extension_type: ItemType,
    extension_id: &str,
) -> Result<Option<String>> {
    Ok(to_reference(store, extension_type, extension_id)?.map(|r| r.slug))
}

/// Extension id of the item with `slug`, provided the item is of `item_type`.
pub fn from_slug(store: &dyn EntityStore, item_type: ItemType, slug: &str) -> Result<Option<String>> {
    if slug.is_empty() {
        return Ok(None);
    }
    let Some(item) = catalog::find_by_slug(store, slug)? else {
        tracing::debug!(slug, "Slug does not resolve to an item");
        return Ok(None);
    };
    if item.item_type != item_type {
        tracing::debug!(
            slug,
            expected = %item_type,
            actual = %item.item_type,
            "Slug resolves to an item of another type"
        );
        return Ok(None);
    }
    Ok(item.extension_ref)
}

/// Reference for the item record with `item_id`, if it exists.
pub fn item_reference(store: &dyn EntityStore, item_id: &str) -> Result<Option<Reference>> {
    Ok(catalog::lookup_item(store, item_id)?.map(|item| Reference::from(&item)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewItem, create_item, delete_item};
    use registry_store::MemoryStore;

    #[test]
    fn test_round_trip_slug_and_extension() {
        let store = MemoryStore::new();
        let item = create_item(&store, NewItem::new("Gmail", ItemType::Tool)).unwrap();
        let ext = item.extension_ref.clone().unwrap();

        assert_eq!(from_slug(&store, ItemType::Tool, "gmail").unwrap(), Some(ext.clone()));
        assert_eq!(to_slug(&store, ItemType::Tool, &ext).unwrap().as_deref(), Some("gmail"));

        let reference = to_reference(&store, ItemType::Tool, &ext).unwrap().unwrap();
        assert_eq!(reference.title, "Gmail");
        assert_eq!(reference.item_type, ItemType::Tool);
        assert_eq!(owner_of(&store, ItemType::Tool, &ext).unwrap(), Some(item.id));
    }

    #[test]
    fn test_from_slug_rejects_type_mismatch_and_unknown() {
        let store = MemoryStore::new();
        create_item(&store, NewItem::new("Gmail", ItemType::Tool)).unwrap();

        assert_eq!(from_slug(&store, ItemType::Skill, "gmail").unwrap(), None);
        assert_eq!(from_slug(&store, ItemType::Tool, "ghost").unwrap(), None);
        assert_eq!(from_slug(&store, ItemType::Tool, "").unwrap(), None);
    }

    #[test]
    fn test_dangling_extension_has_no_reference() {
        let store = MemoryStore::new();
        let item = create_item(&store, NewItem::new("Gmail", ItemType::Tool)).unwrap();
        let ext = item.extension_ref.clone().unwrap();
        delete_item(&store, &item.id).unwrap();

        assert_eq!(to_reference(&store, ItemType::Tool, &ext).unwrap(), None);
        assert_eq!(to_slug(&store, ItemType::Tool, "never-existed").unwrap(), None);
    }

    #[test]
    fn test_missing_owner_item_has_no_reference() {
        let store = MemoryStore::new();
        let ext = crate::extension::create_empty(&store, ItemType::Skill, "gone").unwrap();
        assert_eq!(owner_of(&store, ItemType::Skill, &ext).unwrap().as_deref(), Some("gone"));
        assert_eq!(to_reference(&store, ItemType::Skill, &ext).unwrap(), None);
    }
}
