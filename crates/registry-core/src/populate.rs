//! Applying a publish payload to an extension
//!
//! Scalars follow patch semantics: only whitelisted fields that are present
//! and non-null are written. Link fields arrive as public slugs (`ui_slug`,
//! `tool_slug`, ...) and are resolved to extension ids before storage.

use registry_meta::ItemType;
use registry_meta::schema::{ChildLink, variant};
use registry_store::{EntityStore, Record};
use serde_json::{Map, Value};

use crate::{Error, Result, extension, reference};

/// Write the extension fields carried by `payload`.
///
/// - Direct links whose slug does not resolve leave the stored value as is.
/// - A child link field present in the payload replaces all of its rows;
///   input rows whose slug does not resolve are dropped.
///
/// # Errors
///
/// `Validation` when a child link field is not an array.
pub fn populate_extension(
    store: &dyn EntityStore,
    item_type: ItemType,
    extension_id: &str,
    payload: &Map<String, Value>,
) -> Result<()> {
    let v = variant(item_type);
    let mut fields = v.scalar_patch(payload);

    for link in v.direct_links() {
        let Some(slug) = payload.get(link.slug_key).and_then(Value::as_str) else {
            continue;
        };
        match reference::from_slug(store, link.target, slug)? {
            Some(target_id) => {
                fields.insert(link.field.to_string(), Value::String(target_id));
            }
            None => {
                tracing::debug!(field = link.field, slug, "Skipping unresolved link");
            }
        }
    }

    extension::patch(store, item_type, extension_id, fields)?;

    for link in v.child_links() {
        match payload.get(link.field) {
            None | Some(Value::Null) => {}
            Some(Value::Array(input)) => {
                let rows = resolve_rows(store, link, input)?;
                extension::replace_rows(store, link, extension_id, rows)?;
            }
            Some(_) => {
                return Err(Error::Validation(format!("'{}' must be a list", link.field)));
            }
        }
    }

    Ok(())
}

fn resolve_rows(store: &dyn EntityStore, link: &ChildLink, input: &[Value]) -> Result<Vec<Record>> {
    let mut rows = Vec::with_capacity(input.len());
    for entry in input {
        let Some(slug) = entry.get(link.slug_key).and_then(Value::as_str) else {
            tracing::debug!(field = link.field, "Skipping row without {}", link.slug_key);
            continue;
        };
        let Some(target_id) = reference::from_slug(store, link.target, slug)? else {
            tracing::debug!(field = link.field, slug, "Skipping unresolved row");
            continue;
        };

        let mut row = Record::new();
        row.insert(link.link.to_string(), Value::String(target_id));
        for attribute in link.attributes {
            let value = entry
                .get(attribute.name)
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| attribute.default.to_value());
            row.insert(attribute.name.to_string(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}
