//! InMemoryIndex - 開発・テスト用の metadata index（localStorage 相当）

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::StorageError;
use crate::ports::MetadataIndex;

/// InMemoryIndex は key → JSON 文字列を保持する
///
/// quota は key と value の byte 数の合計に対してかかります。
#[derive(Default)]
pub struct InMemoryIndex {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    unavailable: AtomicBool,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota: Some(quota_bytes),
            ..Self::default()
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn items(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory index disabled".into()));
        }
        Ok(())
    }
}

impl MetadataIndex for InMemoryIndex {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.ensure_available()?;
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        let mut items = self.items();
        if let Some(quota) = self.quota {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let requested = key.len() + value.len();
            if used + requested > quota {
                return Err(StorageError::QuotaExceeded(format!(
                    "{requested} bytes requested, {} bytes remaining",
                    quota.saturating_sub(used)
                )));
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.items().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn test_set_get_remove() {
        let index = InMemoryIndex::new();
        index.set_item("k", "[]").unwrap();
        assert_eq!(index.get_item("k").unwrap().as_deref(), Some("[]"));

        index.remove_item("k").unwrap();
        assert_eq!(index.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_quota_counts_keys_and_values() {
        let index = InMemoryIndex::with_quota(6);
        index.set_item("k", "12345").unwrap();

        let err = index.set_item("k", "123456").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageQuotaExceeded);
        assert_eq!(index.get_item("k").unwrap().as_deref(), Some("12345"));
    }
}
