//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 設定の検証とストレージの有無を build() で確認
//! - 差し替え可能な部品（Clock, IdGenerator, curation）は既定値を持つ

use std::sync::Arc;

use bytes::Bytes;

use crate::capture::CaptureSession;
use crate::catalog::Catalog;
use crate::config::{ConfigError, PitchboxConfig};
use crate::domain::{ArtifactRecord, BinaryPayload, NewArtifact, PitchboxError};
use crate::impls::RandomEngagement;
use crate::playback::PlaybackController;
use crate::ports::{
    BinaryTier, Clock, EngagementSource, FeaturedSource, FullscreenHost, IdGenerator,
    MediaDevices, MetadataIndex, PlaybackEngine, PopularityRanker, SystemClock, UlidGenerator,
};
use crate::store::{BlobStore, ObjectUrlRegistry};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .config(PitchboxConfig::load("pitchbox.toml")?)
///     .binary_tier(Arc::new(FsBinaryTier::new("data/blobs")?))
///     .metadata_index(Arc::new(JsonFileIndex::new("data/index.json")?))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に設定を検証する
/// - binary tier と metadata index は必須。無ければ BuildError を返す
pub struct AppBuilder {
    config: PitchboxConfig,
    binary: Option<Arc<dyn BinaryTier>>,
    index: Option<Arc<dyn MetadataIndex>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    ranker: Option<Arc<dyn PopularityRanker>>,
    featured: Option<Arc<dyn FeaturedSource>>,
    engagement: Option<Arc<dyn EngagementSource>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no binary tier was configured")]
    MissingBinaryTier,

    #[error("no metadata index was configured")]
    MissingMetadataIndex,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: PitchboxConfig::default(),
            binary: None,
            index: None,
            clock: None,
            ids: None,
            ranker: None,
            featured: None,
            engagement: None,
        }
    }

    pub fn config(mut self, config: PitchboxConfig) -> Self {
        self.config = config;
        self
    }

    pub fn binary_tier(mut self, binary: Arc<dyn BinaryTier>) -> Self {
        self.binary = Some(binary);
        self
    }

    pub fn metadata_index(mut self, index: Arc<dyn MetadataIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// 既定: SystemClock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 既定: clock を使う UlidGenerator
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn ranker(mut self, ranker: Arc<dyn PopularityRanker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    pub fn featured_source(mut self, featured: Arc<dyn FeaturedSource>) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn engagement_source(mut self, engagement: Arc<dyn EngagementSource>) -> Self {
        self.engagement = Some(engagement);
        self
    }

    /// AppBuilder を構築して App を生成
    ///
    /// # 検証
    /// - `PitchboxConfig::validate`
    /// - binary tier / metadata index が設定されているか
    ///
    /// curation を 1 つも渡さなかった部分は `RandomEngagement`（表示用の乱数）で埋める。
    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;
        let binary = self.binary.ok_or(BuildError::MissingBinaryTier)?;
        let index = self.index.ok_or(BuildError::MissingMetadataIndex)?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let ids = self.ids.unwrap_or_else(|| {
            let generator: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(clock.clone()));
            generator
        });

        let random = Arc::new(RandomEngagement::new());
        let ranker = self
            .ranker
            .unwrap_or_else(|| random.clone() as Arc<dyn PopularityRanker>);
        let featured = self
            .featured
            .unwrap_or_else(|| random.clone() as Arc<dyn FeaturedSource>);
        let engagement = self
            .engagement
            .unwrap_or_else(|| random as Arc<dyn EngagementSource>);

        let store = Arc::new(BlobStore::new(
            binary,
            index,
            ObjectUrlRegistry::new(),
            self.config.store.clone(),
        ));
        let catalog = Catalog::new(store.clone(), ranker, featured, engagement);

        tracing::debug!(index_key = %self.config.store.index_key, "app built");
        Ok(App {
            config: self.config,
            store,
            catalog,
            clock,
            ids,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App は組み立て済みのストア・一覧・各 session の生成元
pub struct App {
    config: PitchboxConfig,
    store: Arc<BlobStore>,
    catalog: Catalog,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl App {
    pub fn config(&self) -> &PitchboxConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 新しい capture session（プレビュー参照はストアと同じ registry に載る）
    pub fn new_capture_session(&self, devices: Arc<dyn MediaDevices>) -> CaptureSession {
        CaptureSession::new(
            devices,
            self.store.urls().clone(),
            self.config.capture.clone(),
        )
    }

    pub fn new_player<E, F>(
        &self,
        engine: E,
        fullscreen_host: F,
    ) -> PlaybackController<E, F, Arc<dyn Clock>>
    where
        E: PlaybackEngine,
        F: FullscreenHost,
    {
        PlaybackController::new(
            engine,
            fullscreen_host,
            self.clock.clone(),
            self.config.playback.clone(),
        )
    }

    /// session の payload を保存し、成功したら session を reset する
    ///
    /// title の検証が payload の有無より先に行われる。
    pub async fn publish(
        &self,
        session: &mut CaptureSession,
        title: &str,
        description: &str,
    ) -> Result<ArtifactRecord, PitchboxError> {
        let payload = session
            .payload()
            .cloned()
            .unwrap_or_else(|| BinaryPayload::new(Bytes::new(), ""));
        let record = self.save_payload(payload, title, description).await?;
        session.reset();
        Ok(record)
    }

    /// 既存の payload をそのまま保存（ID と作成日時はここで決める）
    pub async fn save_payload(
        &self,
        payload: BinaryPayload,
        title: &str,
        description: &str,
    ) -> Result<ArtifactRecord, PitchboxError> {
        let artifact = NewArtifact {
            id: self.ids.generate_artifact_id(),
            title: title.to_string(),
            description: description.to_string(),
            payload,
            created_at: self.clock.now(),
        };
        self.store.save(artifact).await
    }
}
