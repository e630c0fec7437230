//! Curation ports - 一覧の並び順・特集・表示用カウンタ
//!
//! 人気度や特集フラグの出所はこのクレートの外にあります。
//! Catalog は比較関数と判定関数を注入されて使うだけです。

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::{ArtifactId, ArtifactRecord, EngagementStats};

/// PopularityRanker は Trending の並び順を決める（`Less` が先頭側）
pub trait PopularityRanker: Send + Sync {
    fn compare(&self, a: &ArtifactRecord, b: &ArtifactRecord) -> Ordering;
}

impl<F> PopularityRanker for F
where
    F: Fn(&ArtifactRecord, &ArtifactRecord) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &ArtifactRecord, b: &ArtifactRecord) -> Ordering {
        self(a, b)
    }
}

/// FeaturedSource は Featured に含めるかどうかを決める
pub trait FeaturedSource: Send + Sync {
    fn is_featured(&self, record: &ArtifactRecord) -> bool;
}

impl<F> FeaturedSource for F
where
    F: Fn(&ArtifactRecord) -> bool + Send + Sync,
{
    fn is_featured(&self, record: &ArtifactRecord) -> bool {
        self(record)
    }
}

/// EngagementSource は表示用のカウンタを返す
pub trait EngagementSource: Send + Sync {
    fn stats_for(&self, record: &ArtifactRecord) -> EngagementStats;

    /// index に残っている id の一覧。これ以外の id について保持している値は捨ててよい
    ///
    /// Catalog が一覧を組み立てるたびに呼ぶ。
    fn retain_only(&self, _live: &HashSet<ArtifactId>) {}
}
