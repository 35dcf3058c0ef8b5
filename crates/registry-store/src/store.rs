//! The entity store contract consumed by the registry core.

use serde_json::Value;

use crate::error::Result;
use crate::filter::Filter;
use crate::record::Record;

/// Transactional key/record store with exact-match and filtered-scan queries.
///
/// Every method is atomic for a single record. No multi-record transaction is
/// offered: a sequence of calls may observe concurrent writes in between.
///
/// Implementations own the bookkeeping fields: they assign `id` on insert
/// (unless the record already carries one), and stamp `created` and
/// `modified`.
pub trait EntityStore: Send + Sync {
    /// Fetch a record by identifier.
    fn get(&self, table: &str, id: &str) -> Result<Option<Record>>;

    /// Every record of `table` matching `filter`, in insertion order.
    fn list(&self, table: &str, filter: &Filter) -> Result<Vec<Record>>;

    /// Insert a record and return its identifier.
    fn insert(&self, table: &str, record: Record) -> Result<String>;

    /// Merge `fields` into an existing record.
    ///
    /// # Errors
    ///
    /// Returns `Error::RecordNotFound` if no record has this identifier.
    fn update(&self, table: &str, id: &str, fields: Record) -> Result<()>;

    /// Remove a record. Returns whether anything was removed.
    fn delete(&self, table: &str, id: &str) -> Result<bool>;

    /// First record matching `filter`.
    fn find(&self, table: &str, filter: &Filter) -> Result<Option<Record>> {
        Ok(self.list(table, filter)?.into_iter().next())
    }

    /// Whether any record matches `filter`.
    fn exists(&self, table: &str, filter: &Filter) -> Result<bool> {
        Ok(self.find(table, filter)?.is_some())
    }

    /// Number of records matching `filter`.
    fn count(&self, table: &str, filter: &Filter) -> Result<usize> {
        Ok(self.list(table, filter)?.len())
    }

    /// A single field of a record, `None` if the record or the field is
    /// missing or the field is `null`.
    fn get_field(&self, table: &str, id: &str, field: &str) -> Result<Option<Value>> {
        Ok(self
            .get(table, id)?
            .and_then(|mut record| record.remove(field))
            .filter(|value| !value.is_null()))
    }
}
