//! In-memory entity store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::record::{CREATED_FIELD, ID_FIELD, MODIFIED_FIELD, Record, record_id};
use crate::store::EntityStore;

/// One named table. Rows are keyed by an insertion sequence number so scans
/// return them in insertion order.
#[derive(Debug, Default)]
pub(crate) struct Table {
    next_seq: u64,
    rows: BTreeMap<u64, Record>,
    index: HashMap<String, u64>,
}

impl Table {
    pub(crate) fn push(&mut self, id: String, record: Record) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(id, seq);
        self.rows.insert(seq, record);
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &Record> {
        self.rows.values()
    }

    fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).and_then(|seq| self.rows.get(seq))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        let seq = *self.index.get(id)?;
        self.rows.get_mut(&seq)
    }

    fn remove(&mut self, id: &str) -> bool {
        match self.index.remove(id) {
            Some(seq) => self.rows.remove(&seq).is_some(),
            None => false,
        }
    }
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Entity store backed by in-process maps.
///
/// Each table is created lazily on first insert. Reads take a shared lock and
/// writes an exclusive lock, so every single-record operation is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every table holding at least one row (sorted).
    pub fn table_names(&self) -> Result<Vec<String>> {
        let tables = self.read()?;
        let mut names: Vec<String> = tables
            .iter()
            .filter(|(_, t)| !t.rows.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Table>>> {
        self.tables.read().map_err(|_| Error::Poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Table>>> {
        self.tables.write().map_err(|_| Error::Poisoned)
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, table: &str, id: &str) -> Result<Option<Record>> {
        let tables = self.read()?;
        Ok(tables.get(table).and_then(|t| t.get(id)).cloned())
    }

    fn list(&self, table: &str, filter: &Filter) -> Result<Vec<Record>> {
        let tables = self.read()?;
        Ok(tables
            .get(table)
            .map(|t| t.rows().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    fn insert(&self, table: &str, mut record: Record) -> Result<String> {
        let id = match record.get(ID_FIELD) {
            None | Some(Value::Null) => Uuid::new_v4().to_string(),
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(Error::InvalidRecord {
                    table: table.to_string(),
                    reason: format!("id must be a string, got {other}"),
                });
            }
        };

        let mut tables = self.write()?;
        let target = tables.entry(table.to_string()).or_default();
        if target.index.contains_key(&id) {
            return Err(Error::DuplicateId {
                table: table.to_string(),
                id,
            });
        }

        let stamp = now();
        record.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        record.insert(CREATED_FIELD.to_string(), stamp.clone());
        record.insert(MODIFIED_FIELD.to_string(), stamp);
        target.push(id.clone(), record);

        tracing::trace!(table, %id, "Inserted record");
        Ok(id)
    }

    fn update(&self, table: &str, id: &str, fields: Record) -> Result<()> {
        let mut tables = self.write()?;
        let record = tables
            .get_mut(table)
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| Error::RecordNotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        for (field, value) in fields {
            // Identity and creation time are immutable.
            if field == ID_FIELD || field == CREATED_FIELD {
                continue;
            }
            record.insert(field, value);
        }
        record.insert(MODIFIED_FIELD.to_string(), now());
        Ok(())
    }

    fn delete(&self, table: &str, id: &str) -> Result<bool> {
        let mut tables = self.write()?;
        let removed = tables.get_mut(table).is_some_and(|t| t.remove(id));
        if removed {
            tracing::trace!(table, id, "Deleted record");
        }
        Ok(removed)
    }
}

/// Insert a record that already carries an `id` without touching its
/// bookkeeping fields. Used when restoring snapshots.
pub(crate) fn restore(table: &mut Table, table_name: &str, record: Record) -> Result<()> {
    let id = record_id(&record)
        .ok_or_else(|| Error::InvalidRecord {
            table: table_name.to_string(),
            reason: "record has no string id".to_string(),
        })?
        .to_string();
    if table.index.contains_key(&id) {
        return Err(Error::DuplicateId {
            table: table_name.to_string(),
            id,
        });
    }
    table.push(id, record);
    Ok(())
}
