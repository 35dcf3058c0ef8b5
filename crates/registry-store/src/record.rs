//! Record shape shared by every table.

use serde_json::{Map, Value};

/// A single stored row: a flat JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// Store-assigned identifier field.
pub const ID_FIELD: &str = "id";

/// Creation timestamp (RFC 3339, UTC), set once on insert.
pub const CREATED_FIELD: &str = "created";

/// Last-write timestamp (RFC 3339, UTC), refreshed on every update.
pub const MODIFIED_FIELD: &str = "modified";

/// Read the identifier of a stored record.
pub fn record_id(record: &Record) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}
