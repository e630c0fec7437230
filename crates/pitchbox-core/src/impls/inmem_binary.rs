//! InMemoryBinaryTier - 開発・テスト用の binary tier
//!
//! # 学習ポイント
//! - `std::sync::Mutex` で HashMap を守る（await をまたいでロックしない）
//! - quota と「ストレージエンジン利用不可」を再現してエラー経路をテストできる

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{ArtifactId, BinaryPayload, StorageError};
use crate::ports::BinaryTier;

/// InMemoryBinaryTier は payload を HashMap に保持する
///
/// # 使用例
/// ```ignore
/// let tier = InMemoryBinaryTier::with_quota(1024 * 1024);
/// tier.put(&id, &payload).await?;
/// ```
#[derive(Default)]
pub struct InMemoryBinaryTier {
    records: Mutex<HashMap<ArtifactId, BinaryPayload>>,
    /// 合計 byte 数の上限（None なら無制限）
    quota: Option<usize>,
    unavailable: AtomicBool,
}

impl InMemoryBinaryTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// private browsing などでエンジンが使えない状態を再現
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<ArtifactId, BinaryPayload>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "in-memory binary tier disabled".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BinaryTier for InMemoryBinaryTier {
    async fn put(&self, id: &ArtifactId, payload: &BinaryPayload) -> Result<(), StorageError> {
        self.ensure_available()?;
        let mut records = self.records();
        if let Some(quota) = self.quota {
            let used: usize = records
                .iter()
                .filter(|(key, _)| *key != id)
                .map(|(_, stored)| stored.len())
                .sum();
            let remaining = quota.saturating_sub(used);
            if payload.len() > remaining {
                return Err(StorageError::QuotaExceeded(format!(
                    "{} bytes requested, {remaining} bytes remaining",
                    payload.len()
                )));
            }
        }
        records.insert(id.clone(), payload.clone());
        Ok(())
    }

    async fn get(&self, id: &ArtifactId) -> Result<Option<BinaryPayload>, StorageError> {
        self.ensure_available()?;
        Ok(self.records().get(id).cloned())
    }

    async fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        self.ensure_available()?;
        Ok(self.records().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[tokio::test]
    async fn test_put_get_delete() {
        let tier = InMemoryBinaryTier::new();
        let id = ArtifactId::new("a");
        let payload = BinaryPayload::new(vec![1, 2, 3], "video/webm");

        tier.put(&id, &payload).await.unwrap();
        assert_eq!(tier.get(&id).await.unwrap(), Some(payload));

        assert!(tier.delete(&id).await.unwrap());
        assert!(!tier.delete(&id).await.unwrap());
        assert_eq!(tier.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quota_exceeded() {
        let tier = InMemoryBinaryTier::with_quota(4);
        tier.put(&"a".into(), &BinaryPayload::new(vec![0; 3], "video/webm"))
            .await
            .unwrap();

        let err = tier
            .put(&"b".into(), &BinaryPayload::new(vec![0; 2], "video/webm"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageQuotaExceeded);
        assert_eq!(tier.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_does_not_count_twice() {
        let tier = InMemoryBinaryTier::with_quota(4);
        let id = ArtifactId::new("a");
        tier.put(&id, &BinaryPayload::new(vec![0; 3], "video/webm"))
            .await
            .unwrap();
        tier.put(&id, &BinaryPayload::new(vec![0; 4], "video/webm"))
            .await
            .unwrap();
        assert_eq!(tier.get(&id).await.unwrap().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unavailable_engine() {
        let tier = InMemoryBinaryTier::new();
        tier.set_unavailable(true);
        let err = tier.get(&"a".into()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    }
}
