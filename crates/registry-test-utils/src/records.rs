//! Raw store writes for malformed or hand-wired catalogs.

use registry_meta::ItemType;
use registry_meta::schema::{ITEM_TABLE, OWNER_FIELD, variant};
use registry_store::{EntityStore, Record};
use serde_json::{Value, json};

/// Insert an item record with no paired extension. Returns its id.
pub fn insert_bare_item(store: &dyn EntityStore, slug: &str, item_type: ItemType) -> String {
    insert_item_record(store, slug, item_type.as_str())
}

/// Insert an item record with an arbitrary `item_type` string, which need
/// not name a known type. Returns its id.
pub fn insert_item_record(store: &dyn EntityStore, slug: &str, item_type: &str) -> String {
    let mut record = Record::new();
    record.insert("slug".into(), json!(slug));
    record.insert("title".into(), json!(slug));
    record.insert("item_type".into(), json!(item_type));
    record.insert("trust_status".into(), json!("approved"));
    store
        .insert(ITEM_TABLE, record)
        .unwrap_or_else(|e| panic!("insert_item_record({slug}): {e}"))
}

/// Point an extension's owner back-reference at another item.
pub fn set_owner(store: &dyn EntityStore, item_type: ItemType, extension_id: &str, item_id: &str) {
    set_field(store, item_type, extension_id, OWNER_FIELD, json!(item_id));
}

/// Overwrite one field of an extension record.
pub fn set_field(
    store: &dyn EntityStore,
    item_type: ItemType,
    extension_id: &str,
    field: &str,
    value: Value,
) {
    let mut fields = Record::new();
    fields.insert(field.to_string(), value);
    store
        .update(variant(item_type).table(), extension_id, fields)
        .unwrap_or_else(|e| panic!("set_field({field}): {e}"));
}
