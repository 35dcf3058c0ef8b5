//! Extension records and their child rows
//!
//! An extension is one record in its variant's table plus, for variants with
//! child links, ordered rows in each child table. [`ExtensionDoc`] gathers
//! both so the resolvers can walk links without knowing how they are stored.

use registry_meta::schema::{
    ChildLink, IDX_FIELD, LinkShape, OWNER_FIELD, PARENT_FIELD, PARENT_FIELD_NAME, edges_from,
    variant,
};
use registry_meta::ItemType;
use registry_store::{EntityStore, Filter, Record, record_id};
use serde_json::Value;

use crate::Result;

/// An extension record loaded together with its child rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionDoc {
    pub id: String,
    pub item_type: ItemType,
    /// The extension record itself, bookkeeping included
    pub fields: Record,
    /// Rows per child link, in declaration order, each sorted by `idx`
    pub children: Vec<(&'static ChildLink, Vec<Record>)>,
}

impl ExtensionDoc {
    /// Identifier of the owning item, if the back-reference is set.
    pub fn owner(&self) -> Option<&str> {
        self.fields.get(OWNER_FIELD).and_then(Value::as_str)
    }

    /// Rows of one child link.
    pub fn rows(&self, link: &ChildLink) -> &[Record] {
        self.children
            .iter()
            .find(|(l, _)| l.field == link.field)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }

    /// Every linked extension id with its target type.
    ///
    /// Direct links come first, then child rows, in schema order. Empty and
    /// non-string link values are skipped.
    pub fn link_targets(&self) -> Vec<(ItemType, String)> {
        let mut targets = Vec::new();
        for edge in edges_from(self.item_type) {
            match edge.shape {
                LinkShape::Direct(link) => {
                    if let Some(id) = link_value(&self.fields, link.field) {
                        targets.push((link.target, id.to_string()));
                    }
                }
                LinkShape::Child(link) => {
                    for row in self.rows(link) {
                        if let Some(id) = link_value(row, link.link) {
                            targets.push((link.target, id.to_string()));
                        }
                    }
                }
            }
        }
        targets
    }
}

/// A non-empty string link value.
pub(crate) fn link_value<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Load an extension and its child rows.
pub fn load(store: &dyn EntityStore, item_type: ItemType, id: &str) -> Result<Option<ExtensionDoc>> {
    let v = variant(item_type);
    let Some(fields) = store.get(v.table(), id)? else {
        return Ok(None);
    };

    let mut children = Vec::with_capacity(v.child_links().len());
    for link in v.child_links() {
        children.push((link, child_rows(store, link, id)?));
    }

    Ok(Some(ExtensionDoc {
        id: id.to_string(),
        item_type,
        fields,
        children,
    }))
}

/// Rows of `link` owned by `parent_id`, ordered by `idx`.
pub fn child_rows(store: &dyn EntityStore, link: &ChildLink, parent_id: &str) -> Result<Vec<Record>> {
    let filter = Filter::new()
        .eq(PARENT_FIELD, parent_id)
        .eq(PARENT_FIELD_NAME, link.field);
    let mut rows = store.list(link.table, &filter)?;
    rows.sort_by_key(|row| row.get(IDX_FIELD).and_then(Value::as_u64).unwrap_or(u64::MAX));
    Ok(rows)
}

/// Create an empty extension owned by `item_id` and return its id.
pub fn create_empty(store: &dyn EntityStore, item_type: ItemType, item_id: &str) -> Result<String> {
    let mut record = Record::new();
    record.insert(OWNER_FIELD.to_string(), Value::String(item_id.to_string()));
    Ok(store.insert(variant(item_type).table(), record)?)
}

/// Merge `fields` into the extension record. An empty patch is a no-op.
pub fn patch(store: &dyn EntityStore, item_type: ItemType, id: &str, fields: Record) -> Result<()> {
    if fields.is_empty() {
        return Ok(());
    }
    store.update(variant(item_type).table(), id, fields)?;
    Ok(())
}

/// Replace every row of `link` under `parent_id` with `rows`, in order.
pub fn replace_rows(
    store: &dyn EntityStore,
    link: &ChildLink,
    parent_id: &str,
    rows: Vec<Record>,
) -> Result<()> {
    delete_rows(store, link, parent_id)?;
    for (idx, mut row) in rows.into_iter().enumerate() {
        row.insert(PARENT_FIELD.to_string(), Value::String(parent_id.to_string()));
        row.insert(PARENT_FIELD_NAME.to_string(), Value::String(link.field.to_string()));
        row.insert(IDX_FIELD.to_string(), Value::from(idx as u64));
        store.insert(link.table, row)?;
    }
    Ok(())
}

fn delete_rows(store: &dyn EntityStore, link: &ChildLink, parent_id: &str) -> Result<()> {
    for row in child_rows(store, link, parent_id)? {
        if let Some(row_id) = record_id(&row) {
            store.delete(link.table, row_id)?;
        }
    }
    Ok(())
}

/// Delete an extension with all of its child rows.
pub fn delete(store: &dyn EntityStore, item_type: ItemType, id: &str) -> Result<bool> {
    let v = variant(item_type);
    for link in v.child_links() {
        delete_rows(store, link, id)?;
    }
    Ok(store.delete(v.table(), id)?)
}

/// Copy of `record` without the named bookkeeping fields.
pub fn strip(record: &Record, bookkeeping: &[&str]) -> Record {
    record
        .iter()
        .filter(|(key, _)| !bookkeeping.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
