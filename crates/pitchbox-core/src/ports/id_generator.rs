//! IdGenerator port - ID 生成の抽象化
//!
//! artifact の ID は保存時に呼び出し側が決めます。
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（Clock の時刻を timestamp 部に使う）

use crate::domain::ArtifactId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は artifact ID を生成
///
/// # ULID の特性
/// - 時刻でソート可能（生成時刻が先頭 48 bit）
/// - 同一ミリ秒でもランダム部で衝突しない
pub trait IdGenerator: Send + Sync {
    fn generate_artifact_id(&self) -> ArtifactId;
}

/// UlidGenerator は Clock の現在時刻から ULID を作る
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_artifact_id(&self) -> ArtifactId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        ArtifactId::from_ulid(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
