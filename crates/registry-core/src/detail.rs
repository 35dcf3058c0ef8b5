//! Public detail view of one item
//!
//! The view carries the item's public fields and tags, its extension with
//! every link replaced by a [`Reference`], and the items that link to it one
//! hop away. Internal identifiers never appear in the output.

use std::collections::HashSet;

use registry_meta::schema::{
    LinkShape, OWNER_FIELD, PARENT_FIELD, PARENT_FIELD_NAME, RECORD_BOOKKEEPING, ROW_BOOKKEEPING,
    edges_from, edges_into, variant,
};
use registry_meta::{Item, ItemType, TrustStatus};
use registry_store::{EntityStore, Filter, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extension::{self, ExtensionDoc, link_value};
use crate::reference::{self, Reference};
use crate::{Result, catalog};

/// Public fields of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub slug: String,
    pub title: String,
    pub item_type: ItemType,
    pub category: Option<String>,
    pub description: String,
    pub trust_status: TrustStatus,
    pub featured: bool,
    pub visibility: Option<String>,
    pub install_count: u64,
    pub author: Option<String>,
    pub version: Option<String>,
    pub source_url: Option<String>,
    pub readme: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
}

impl ItemView {
    pub fn new(item: Item, tags: Vec<String>) -> Self {
        Self {
            slug: item.slug,
            title: item.title,
            item_type: item.item_type,
            category: item.category,
            description: item.description,
            trust_status: item.trust_status,
            featured: item.featured,
            visibility: item.visibility,
            install_count: item.install_count,
            author: item.author,
            version: item.version,
            source_url: item.source_url,
            readme: item.readme,
            image: item.image,
            tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub registry: ItemView,
    pub extension: Option<Record>,
    /// Items linking to this one; omitted when there are none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<Reference>>,
}

/// Detail view of the item with `slug`.
///
/// # Errors
///
/// - `Validation` for an empty slug
/// - `NotFound` for an unknown slug
pub fn get_item_detail(store: &dyn EntityStore, slug: &str) -> Result<ItemDetail> {
    let item = catalog::require_by_slug(store, slug)?;
    let tags = catalog::tags_for(store, &item.id)?;

    let (extension, parents) = match item.extension_ref.as_deref() {
        Some(extension_id) => {
            let extension = extension::load(store, item.item_type, extension_id)?
                .map(|doc| public_extension(store, &doc))
                .transpose()?;
            let parents = parents_of(store, item.item_type, extension_id)?;
            (extension, parents)
        }
        None => (None, Vec::new()),
    };

    Ok(ItemDetail {
        registry: ItemView::new(item, tags),
        extension,
        parents: (!parents.is_empty()).then_some(parents),
    })
}

/// Extension payload with every link replaced by `<field>_ref`.
fn public_extension(store: &dyn EntityStore, doc: &ExtensionDoc) -> Result<Record> {
    let mut out = extension::strip(&doc.fields, RECORD_BOOKKEEPING);

    for edge in edges_from(doc.item_type) {
        match edge.shape {
            LinkShape::Direct(link) => {
                let reference = resolve(store, link.target, link_value(&out, link.field))?;
                out.remove(link.field);
                if let Some(reference) = reference {
                    out.insert(format!("{}_ref", link.field), serde_json::to_value(reference)?);
                }
            }
            LinkShape::Child(link) => {
                let mut rows = Vec::new();
                for row in doc.rows(link) {
                    let mut row = extension::strip(row, ROW_BOOKKEEPING);
                    let reference = resolve(store, link.target, link_value(&row, link.link))?;
                    row.remove(link.link);
                    if let Some(reference) = reference {
                        row.insert(format!("{}_ref", link.link), serde_json::to_value(reference)?);
                    }
                    rows.push(Value::Object(row));
                }
                out.insert(link.field.to_string(), Value::Array(rows));
            }
        }
    }

    Ok(out)
}

fn resolve(store: &dyn EntityStore, target: ItemType, id: Option<&str>) -> Result<Option<Reference>> {
    match id {
        Some(id) => reference::to_reference(store, target, id),
        None => Ok(None),
    }
}

/// Items whose extensions link to `extension_id`, one hop back.
///
/// Child-row links are scanned before direct links. Each item appears once.
pub fn parents_of(
    store: &dyn EntityStore,
    item_type: ItemType,
    extension_id: &str,
) -> Result<Vec<Reference>> {
    let incoming = edges_into(item_type);
    let mut owners: Vec<String> = Vec::new();

    for edge in &incoming {
        if let LinkShape::Child(link) = edge.shape {
            let filter = Filter::new()
                .eq(link.link, extension_id)
                .eq(PARENT_FIELD_NAME, link.field);
            for row in store.list(link.table, &filter)? {
                if let Some(parent) = row.get(PARENT_FIELD).and_then(Value::as_str) {
                    if let Some(owner) = reference::owner_of(store, edge.source, parent)? {
                        owners.push(owner);
                    }
                }
            }
        }
    }

    for edge in &incoming {
        if let LinkShape::Direct(link) = edge.shape {
            let filter = Filter::new().eq(link.field, extension_id);
            for record in store.list(variant(edge.source).table(), &filter)? {
                if let Some(owner) = link_value(&record, OWNER_FIELD) {
                    owners.push(owner.to_string());
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let mut parents = Vec::new();
    for owner in owners {
        if !seen.insert(owner.clone()) {
            continue;
        }
        if let Some(parent) = reference::item_reference(store, &owner)? {
            parents.push(parent);
        }
    }
    Ok(parents)
}
