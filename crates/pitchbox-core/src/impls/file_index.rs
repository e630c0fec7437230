//! JsonFileIndex - metadata index stored as a single JSON object file.
//!
//! The whole file is read on every access; it only ever holds small
//! metadata strings, never payload bytes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::domain::StorageError;
use crate::ports::MetadataIndex;

/// Key-value index persisted at `path` as `{"key": "value", ...}`.
#[derive(Debug)]
pub struct JsonFileIndex {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileIndex {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(&format!("create {}", parent.display()), e))?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_map(&self) -> Result<Option<BTreeMap<String, String>>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Some(BTreeMap::new()));
            }
            Err(e) => {
                return Err(StorageError::from_io(
                    &format!("read {}", self.path.display()),
                    e,
                ));
            }
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(Some(map)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "index file is not a JSON object"
                );
                Ok(None)
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw)
            .map_err(|e| StorageError::from_io(&format!("write {}", tmp.display()), e))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StorageError::from_io(&format!("rename {}", self.path.display()), e))
    }

    /// Writes refuse to clobber a file that could not be parsed.
    fn read_map_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        self.read_map()?.ok_or_else(|| {
            StorageError::Unavailable(format!(
                "refusing to overwrite unreadable index {}",
                self.path.display()
            ))
        })
    }
}

impl MetadataIndex for JsonFileIndex {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.and_then(|mut map| map.remove(key)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock();
        let mut map = self.read_map_for_write()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock();
        let mut map = self.read_map_for_write()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}
