//! Snapshot persistence for [`MemoryStore`].
//!
//! A snapshot is a single JSON document holding every table's rows in
//! insertion order. Loading takes a shared lock on the file and saving an
//! exclusive one, writing to a temporary sibling first and renaming it over
//! the target.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::memory::{MemoryStore, Table, restore};
use crate::record::Record;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Serialized form of a whole store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version for forward compatibility
    pub version: String,
    /// Rows per table, in insertion order
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Record>>,
}

impl MemoryStore {
    /// Capture every table.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let tables = self.read()?;
        let tables = tables
            .iter()
            .filter(|(_, t)| t.rows().next().is_some())
            .map(|(name, t)| (name.clone(), t.rows().cloned().collect()))
            .collect();
        Ok(Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            tables,
        })
    }

    /// Rebuild a store from a snapshot. Bookkeeping fields are kept verbatim.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut tables: HashMap<String, Table> = HashMap::new();
        for (name, rows) in snapshot.tables {
            let table = tables.entry(name.clone()).or_default();
            for row in rows {
                restore(table, &name, row)?;
            }
        }
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Load a store from a snapshot file with a shared lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, locked, or parsed, or if
    /// its version is not supported.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        file.lock_shared()?;

        // Read through the locked handle
        let mut content = String::new();
        (&file).read_to_string(&mut content)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::UnsupportedSnapshot {
                path: path.to_path_buf(),
                version: snapshot.version,
            });
        }

        tracing::debug!(?path, tables = snapshot.tables.len(), "Loaded store snapshot");
        Self::from_snapshot(snapshot)
    }

    /// Load a snapshot if the file exists, otherwise start empty.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save the store to a snapshot file atomically.
    ///
    /// The snapshot is written to a locked temporary sibling, synced, and
    /// renamed over `path`. A failed save leaves any previous file intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.snapshot()?)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = temp_sibling(path);
        if let Err(err) = write_locked(&temp_path, content.as_bytes()) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }
        if let Err(err) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        tracing::debug!(?path, "Saved store snapshot");
        Ok(())
    }
}

/// Temporary file next to `path`, so the rename stays on one filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn write_locked(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.lock_exclusive()?;
    file.write_all(content)?;
    file.sync_all()?;
    file.unlock()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::{EntityStore, Filter};
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_save_and_load_preserves_rows_and_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::new();
        let first = store.insert("item", record(json!({"slug": "b"}))).unwrap();
        store.insert("item", record(json!({"slug": "a"}))).unwrap();
        store.insert("tag", record(json!({"item": first, "tag": "mail"}))).unwrap();
        store.save(&path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);

        let loaded = MemoryStore::load(&path).unwrap();
        let slugs: Vec<_> = loaded
            .list("item", &Filter::new())
            .unwrap()
            .into_iter()
            .map(|r| r["slug"].clone())
            .collect();
        assert_eq!(slugs, vec![json!("b"), json!("a")]);
        assert_eq!(
            loaded.get("item", &first).unwrap(),
            store.get("item", &first).unwrap()
        );
        assert_eq!(loaded.count("tag", &Filter::new()).unwrap(), 1);
    }

    #[test]
    fn test_loaded_store_keeps_accepting_inserts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = MemoryStore::new();
        store.insert("item", record(json!({"slug": "a"}))).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        loaded.insert("item", record(json!({"slug": "b"}))).unwrap();
        assert_eq!(loaded.count("item", &Filter::new()).unwrap(), 2);
    }

    #[test]
    fn test_load_or_create_missing_file() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::load_or_create(&dir.path().join("absent.json")).unwrap();
        assert!(store.table_names().unwrap().is_empty());
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"version": "9.9", "tables": {}}"#).unwrap();

        let err = MemoryStore::load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSnapshot { .. }));
    }

    #[test]
    fn test_from_snapshot_rejects_rows_without_id() {
        let mut tables = BTreeMap::new();
        tables.insert("item".to_string(), vec![record(json!({"slug": "a"}))]);
        let err = MemoryStore::from_snapshot(Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            tables,
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));
    }

    #[test]
    fn test_failed_save_leaves_no_files_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        // A non-empty directory cannot be replaced by the rename
        fs::create_dir_all(path.join("occupied")).unwrap();

        let store = MemoryStore::new();
        store.insert("item", record(json!({"slug": "a"}))).unwrap();
        assert!(matches!(store.save(&path), Err(Error::Io(_))));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
        assert!(path.is_dir());
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::new();
        store.insert("item", record(json!({"slug": "a"}))).unwrap();
        store.save(&path).unwrap();
        store.insert("item", record(json!({"slug": "b"}))).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load_or_create(&path).unwrap();
        assert_eq!(loaded.count("item", &Filter::new()).unwrap(), 2);
    }
}
