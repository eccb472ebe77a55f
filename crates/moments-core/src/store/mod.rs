//! Flat key-value persistence for the local device.
//!
//! Backs the demo-mode drive stand-in and any local mirrors keyed by
//! identity id. Single-user, single-process; reads and writes are
//! synchronous whole-document operations with an explicit schema version.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u32,
    entries: BTreeMap<String, serde_json::Value>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// JSON-file-backed key-value store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a store at the given path, validating the schema version of any
    /// existing document. The file is created lazily on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        // Surface version mismatches at open time, not first read.
        store.load()?;
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let document = self.load()?;
        document
            .entries
            .get(key)
            .map(|value| serde_json::from_value(value.clone()).map_err(Error::Serialization))
            .transpose()
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut document = self.load()?;
        document
            .entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.save(&document)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut document = self.load()?;
        if document.entries.remove(key).is_some() {
            self.save(&document)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<StoreDocument> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreDocument::default());
            }
            Err(error) => return Err(Error::Io(error)),
        };

        let document: StoreDocument = serde_json::from_str(&raw)?;
        if document.schema_version != STORE_SCHEMA_VERSION {
            return Err(Error::Storage(format!(
                "unsupported store schema_version {} (expected {}) in {}",
                document.schema_version,
                STORE_SCHEMA_VERSION,
                self.path.display()
            )));
        }
        Ok(document)
    }

    fn save(&self, document: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.path, serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).unwrap();
        let value: Option<String> = store.get("anything").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn put_get_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).unwrap();

        store.put("greeting", &"hello".to_string()).unwrap();
        assert_eq!(
            store.get::<String>("greeting").unwrap(),
            Some("hello".to_string())
        );

        store.remove("greeting").unwrap();
        assert_eq!(store.get::<String>("greeting").unwrap(), None);
    }

    #[test]
    fn written_document_carries_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).unwrap();
        store.put("k", &1_i64).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"schema_version\": 1"));
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"schema_version": 99, "entries": {}}"#).unwrap();

        let error = FileStore::open(&path).unwrap_err();
        assert!(matches!(error, Error::Storage(_)));
    }
}
