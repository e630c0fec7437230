//! BinaryTier port - 巨大データ（動画 payload）の保存先
//!
//! BinaryTier は `{id, payload}` のレコードを id で保存します。
//!
//! # 設計原則
//! - payload は MB 単位になり得るので、1 件ずつ非同期で読み書きする
//! - metadata（title など）は持たない。それは MetadataIndex の役割
//! - 書き込みが失敗したら何も残さない（途中まで書かれた payload を見せない）

use async_trait::async_trait;

use crate::domain::{ArtifactId, BinaryPayload, StorageError};

/// BinaryTier は payload を id で保存・取得・削除する
///
/// # 実装
/// - `InMemoryBinaryTier`（開発・テスト用、quota を設定可能）
/// - `FsBinaryTier`（ファイル 1 つ = レコード 1 件）
#[async_trait]
pub trait BinaryTier: Send + Sync {
    /// payload を保存（同じ id があれば上書き）
    async fn put(&self, id: &ArtifactId, payload: &BinaryPayload) -> Result<(), StorageError>;

    /// payload を取得（無ければ `Ok(None)`）
    async fn get(&self, id: &ArtifactId) -> Result<Option<BinaryPayload>, StorageError>;

    /// payload を削除。存在していたら `true`
    async fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError>;
}
