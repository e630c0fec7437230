//! BlobStore - 二層構造の永続化（binary tier + metadata index）
//!
//! # 設計原則
//! - save: binary → metadata の順に書く。binary が失敗したら metadata は書かない
//!   （metadata 書き込みだけが失敗した場合、参照されない payload が残るが無害）
//! - remove: metadata → binary の順に消す。binary 削除が失敗しても、
//!   消えた payload を「ある」と言い張る metadata は残らない
//! - metadata index は壊れていても致命的ではない（空として扱う）
//! - resolve の失敗は伝播させず `None` にする（一覧の 1 件の失敗で全体を壊さない）

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::StoreConfig;
use crate::domain::{
    ArtifactId, ArtifactRecord, BinaryPayload, ErrorKind, NewArtifact, PitchboxError,
    StorageError, ValidationError,
};
use crate::ports::{BinaryTier, MetadataIndex};

use super::display::{DisplayRef, ObjectUrlRegistry};

/// BlobStore は artifact の保存・一覧・解決・削除を行う
///
/// # 使用例
/// ```ignore
/// let store = BlobStore::new(
///     Arc::new(InMemoryBinaryTier::new()),
///     Arc::new(InMemoryIndex::new()),
///     ObjectUrlRegistry::new(),
///     StoreConfig::default(),
/// );
/// let record = store.save(new_artifact).await?;
/// let display = store.resolve(&record.id).await;
/// ```
pub struct BlobStore {
    binary: Arc<dyn BinaryTier>,
    index: Arc<dyn MetadataIndex>,
    urls: ObjectUrlRegistry,
    config: StoreConfig,
    /// index の read-modify-write を直列化する（await をまたがない）
    index_guard: Mutex<()>,
}

impl BlobStore {
    pub fn new(
        binary: Arc<dyn BinaryTier>,
        index: Arc<dyn MetadataIndex>,
        urls: ObjectUrlRegistry,
        config: StoreConfig,
    ) -> Self {
        Self {
            binary,
            index,
            urls,
            config,
            index_guard: Mutex::new(()),
        }
    }

    pub fn urls(&self) -> &ObjectUrlRegistry {
        &self.urls
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn lock_index(&self) -> MutexGuard<'_, ()> {
        self.index_guard.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// index を読む。壊れた JSON は警告を出して空として扱う
    fn read_index(&self) -> Result<Vec<ArtifactRecord>, StorageError> {
        let Some(raw) = self.index.get_item(&self.config.index_key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    key = %self.config.index_key,
                    error = %e,
                    "metadata index is unparseable; treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    fn write_index(&self, records: &[ArtifactRecord]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(records)?;
        self.index.set_item(&self.config.index_key, &raw)
    }

    /// payload を binary tier に、metadata を index の先頭に保存
    #[tracing::instrument(skip(self, artifact), fields(id = %artifact.id, size = artifact.payload.len()))]
    pub async fn save(&self, artifact: NewArtifact) -> Result<ArtifactRecord, PitchboxError> {
        artifact.validate(self.config.limits())?;
        if artifact.payload.is_empty() {
            return Err(ValidationError::MissingPayload.into());
        }

        self.binary.put(&artifact.id, &artifact.payload).await?;

        let record = artifact.to_record(self.config.binary_ref_for(&artifact.id));
        {
            let _guard = self.lock_index();
            let mut records = self.read_index()?;
            records.insert(0, record.clone());
            if let Err(e) = self.write_index(&records) {
                tracing::warn!(
                    error = %e,
                    "metadata write failed after payload write; payload left unreferenced"
                );
                return Err(e.into());
            }
        }

        tracing::info!(title = %record.title, "artifact saved");
        Ok(record)
    }

    /// index の全レコード（新しく追加した順）
    pub fn list_all(&self) -> Result<Vec<ArtifactRecord>, StorageError> {
        self.read_index()
    }

    /// metadata を 1 件取得
    pub fn get(&self, id: &ArtifactId) -> Result<Option<ArtifactRecord>, StorageError> {
        Ok(self.read_index()?.into_iter().find(|record| &record.id == id))
    }

    /// payload を取得。無ければ `NotFound`
    ///
    /// metadata があるのに payload が無い（orphaned reference）場合は
    /// 区別してログに残したうえで `NotFound` を返す。
    #[tracing::instrument(skip(self))]
    pub async fn fetch_payload(&self, id: &ArtifactId) -> Result<BinaryPayload, StorageError> {
        if let Some(payload) = self.binary.get(id).await? {
            return Ok(payload);
        }
        if matches!(self.get(id), Ok(Some(_))) {
            tracing::warn!(
                kind = ?ErrorKind::OrphanedReference,
                "metadata references a payload that is missing"
            );
        }
        Err(StorageError::NotFound(id.clone()))
    }

    /// payload を取得して一時 URL を発行する。失敗したら `None`
    ///
    /// 呼び出しのたびに新しい URL が発行されます。
    /// 表示をやめたら呼び出し側が `DisplayRef::release` すること。
    pub async fn resolve(&self, id: &ArtifactId) -> Option<DisplayRef> {
        match self.fetch_payload(id).await {
            Ok(payload) => Some(self.urls.create(payload)),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to resolve artifact");
                None
            }
        }
    }

    /// metadata と payload の両方を削除
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: &ArtifactId) -> Result<(), StorageError> {
        let listed = {
            let _guard = self.lock_index();
            let records = self.read_index()?;
            let before = records.len();
            let remaining: Vec<ArtifactRecord> =
                records.into_iter().filter(|record| &record.id != id).collect();
            let listed = remaining.len() != before;
            if listed {
                self.write_index(&remaining)?;
            }
            listed
        };

        let had_payload = match self.binary.delete(id).await {
            Ok(existed) => existed,
            Err(e) if listed => {
                tracing::warn!(
                    error = %e,
                    "metadata removed but payload delete failed; payload left unreferenced"
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if !listed && !had_payload {
            return Err(StorageError::NotFound(id.clone()));
        }
        tracing::info!("artifact removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::impls::{InMemoryBinaryTier, InMemoryIndex};
    use chrono::{Duration, TimeZone, Utc};

    struct Fixture {
        binary: Arc<InMemoryBinaryTier>,
        index: Arc<InMemoryIndex>,
        store: BlobStore,
    }

    fn fixture_with(binary: InMemoryBinaryTier, index: InMemoryIndex) -> Fixture {
        let binary = Arc::new(binary);
        let index = Arc::new(index);
        let store = BlobStore::new(
            binary.clone(),
            index.clone(),
            ObjectUrlRegistry::new(),
            StoreConfig::default(),
        );
        Fixture {
            binary,
            index,
            store,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(InMemoryBinaryTier::new(), InMemoryIndex::new())
    }

    fn artifact(id: &str, title: &str, bytes: &[u8]) -> NewArtifact {
        NewArtifact {
            id: ArtifactId::new(id),
            title: title.to_string(),
            description: format!("{title} description"),
            payload: BinaryPayload::new(bytes.to_vec(), "video/webm"),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_save_then_resolve_round_trip() {
        let f = fixture();
        let record = f.store.save(artifact("1", "Eco", b"webm-bytes")).await.unwrap();
        assert_eq!(record.binary_ref, "pitchhouse_blob_1");

        let listed = f.store.list_all().unwrap();
        assert_eq!(listed, vec![record.clone()]);

        let display = f.store.resolve(&record.id).await.unwrap();
        let payload = f.store.urls().lookup(display.url()).unwrap();
        assert_eq!(payload.bytes().as_ref(), b"webm-bytes");
        assert_eq!(payload.mime_type(), "video/webm");
    }

    #[tokio::test]
    async fn test_list_is_newest_insertion_first() {
        let f = fixture();
        let mut older = artifact("1", "First", b"a");
        older.created_at += Duration::days(1);
        f.store.save(older).await.unwrap();
        f.store.save(artifact("2", "Second", b"b")).await.unwrap();

        let ids: Vec<String> = f
            .store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_each_resolve_allocates_a_new_reference() {
        let f = fixture();
        f.store.save(artifact("1", "Eco", b"x")).await.unwrap();

        let a = f.store.resolve(&"1".into()).await.unwrap();
        let b = f.store.resolve(&"1".into()).await.unwrap();
        assert_ne!(a.url(), b.url());
        assert_eq!(f.store.urls().live_count(), 2);

        a.release();
        b.release();
        assert_eq!(f.store.urls().live_count(), 0);
    }

    #[tokio::test]
    async fn test_binary_failure_writes_no_metadata() {
        let f = fixture_with(InMemoryBinaryTier::with_quota(4), InMemoryIndex::new());

        let err = f
            .store
            .save(artifact("1", "Too big", b"0123456789"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StorageQuotaExceeded);
        assert!(f.store.list_all().unwrap().is_empty());
        assert!(f.binary.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_failure_leaves_prior_records_untouched() {
        let f = fixture();
        let first = f.store.save(artifact("1", "Eco", b"a")).await.unwrap();

        f.index.set_unavailable(true);
        let err = f.store.save(artifact("2", "Foo", b"b")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);

        f.index.set_unavailable(false);
        assert_eq!(f.store.list_all().unwrap(), vec![first]);
        // the unreferenced payload is tolerated
        assert_eq!(f.binary.len(), 2);
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_write() {
        let f = fixture();
        let err = f.store.save(artifact("1", "  ", b"a")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        let err = f.store.save(artifact("2", "Empty", b"")).await.unwrap_err();
        assert!(matches!(
            err,
            PitchboxError::Validation(ValidationError::MissingPayload)
        ));
        assert!(f.binary.is_empty());
    }

    #[tokio::test]
    async fn test_remove_then_resolve_yields_none() {
        let f = fixture();
        f.store.save(artifact("1", "Eco", b"a")).await.unwrap();
        f.store.save(artifact("2", "Foo", b"b")).await.unwrap();

        f.store.remove(&"1".into()).await.unwrap();

        assert!(f.store.resolve(&"1".into()).await.is_none());
        let ids: Vec<ArtifactId> = f.store.list_all().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![ArtifactId::new("2")]);
    }

    #[tokio::test]
    async fn test_failed_payload_delete_never_leaves_a_dangling_record() {
        let f = fixture();
        f.store.save(artifact("1", "Eco", b"a")).await.unwrap();

        f.binary.set_unavailable(true);
        let err = f.store.remove(&"1".into()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert!(f.store.list_all().unwrap().is_empty());

        f.binary.set_unavailable(false);
        // the payload survives unreferenced
        assert_eq!(f.binary.len(), 1);
        assert!(f.binary.get(&"1".into()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_not_found() {
        let f = fixture();
        let err = f.store.remove(&"missing".into()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_orphaned_reference_is_not_found() {
        let f = fixture();
        f.store.save(artifact("1", "Eco", b"a")).await.unwrap();
        f.binary.delete(&"1".into()).await.unwrap();

        assert!(f.store.resolve(&"1".into()).await.is_none());
        let err = f.store.fetch_payload(&"1".into()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        // the record itself is still listed
        assert_eq!(f.store.list_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_index_reads_as_empty() {
        let f = fixture();
        f.index.set_item("pitchhouse_videos", "{not json").unwrap();

        assert!(f.store.list_all().unwrap().is_empty());

        // a save afterwards starts a fresh index
        f.store.save(artifact("1", "Eco", b"a")).await.unwrap();
        assert_eq!(f.store.list_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_survives_unavailable_binary_tier() {
        let f = fixture();
        f.store.save(artifact("1", "Eco", b"a")).await.unwrap();
        f.binary.set_unavailable(true);

        assert!(f.store.resolve(&"1".into()).await.is_none());
    }
}
