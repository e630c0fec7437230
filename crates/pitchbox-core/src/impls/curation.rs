//! Curation sources for the catalog.
//!
//! - `EngagementTable`: explicit per-artifact counters and feature flags.
//! - `RandomEngagement`: random display filler, fixed per artifact once drawn.
//!
//! Both rank Trending by likes, highest first.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use rand::Rng;

use crate::domain::{ArtifactId, ArtifactRecord, EngagementStats};
use crate::ports::{EngagementSource, FeaturedSource, PopularityRanker};

/// Deterministic counters, mostly for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct EngagementTable {
    stats: HashMap<ArtifactId, EngagementStats>,
    featured: HashSet<ArtifactId>,
}

impl EngagementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(mut self, id: impl Into<ArtifactId>, stats: EngagementStats) -> Self {
        self.stats.insert(id.into(), stats);
        self
    }

    pub fn with_likes(self, id: impl Into<ArtifactId>, likes: u32) -> Self {
        self.with_stats(
            id,
            EngagementStats {
                likes,
                ..EngagementStats::default()
            },
        )
    }

    pub fn feature(mut self, id: impl Into<ArtifactId>) -> Self {
        self.featured.insert(id.into());
        self
    }
}

impl EngagementSource for EngagementTable {
    fn stats_for(&self, record: &ArtifactRecord) -> EngagementStats {
        self.stats.get(&record.id).copied().unwrap_or_default()
    }
}

impl FeaturedSource for EngagementTable {
    fn is_featured(&self, record: &ArtifactRecord) -> bool {
        self.featured.contains(&record.id)
    }
}

impl PopularityRanker for EngagementTable {
    fn compare(&self, a: &ArtifactRecord, b: &ArtifactRecord) -> Ordering {
        self.stats_for(b).likes.cmp(&self.stats_for(a).likes)
    }
}

#[derive(Debug, Clone, Copy)]
struct Drawn {
    stats: EngagementStats,
    featured: bool,
}

/// Random stand-in counters: likes 0..50, comments 0..10, views 50..250,
/// featured with probability 0.2. Values are drawn once per artifact.
#[derive(Debug, Default)]
pub struct RandomEngagement {
    drawn: Mutex<HashMap<ArtifactId, Drawn>>,
}

impl RandomEngagement {
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を引いた artifact の数
    pub fn drawn_count(&self) -> usize {
        self.drawn.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn draw(&self, id: &ArtifactId) -> Drawn {
        let mut drawn = self.drawn.lock().unwrap_or_else(|e| e.into_inner());
        *drawn.entry(id.clone()).or_insert_with(|| {
            let mut rng = rand::thread_rng();
            Drawn {
                stats: EngagementStats {
                    likes: rng.gen_range(0..50),
                    comments: rng.gen_range(0..10),
                    views: rng.gen_range(50..250),
                },
                featured: rng.gen_bool(0.2),
            }
        })
    }
}

impl EngagementSource for RandomEngagement {
    fn stats_for(&self, record: &ArtifactRecord) -> EngagementStats {
        self.draw(&record.id).stats
    }

    fn retain_only(&self, live: &HashSet<ArtifactId>) {
        let mut drawn = self.drawn.lock().unwrap_or_else(|e| e.into_inner());
        let before = drawn.len();
        drawn.retain(|id, _| live.contains(id));
        if drawn.len() < before {
            tracing::debug!(evicted = before - drawn.len(), "dropped stats of removed artifacts");
        }
    }
}

impl FeaturedSource for RandomEngagement {
    fn is_featured(&self, record: &ArtifactRecord) -> bool {
        self.draw(&record.id).featured
    }
}

impl PopularityRanker for RandomEngagement {
    fn compare(&self, a: &ArtifactRecord, b: &ArtifactRecord) -> Ordering {
        self.draw(&b.id).stats.likes.cmp(&self.draw(&a.id).stats.likes)
    }
}
