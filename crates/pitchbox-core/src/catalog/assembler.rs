//! Catalog - 一覧の組み立て
//!
//! # アルゴリズム
//! 1. `BlobStore::list_all` で metadata を全件読む
//! 2. カテゴリを適用（All: そのまま / Newest: 日付降順 / Trending: 注入された比較関数 /
//!    Featured: 注入された判定で絞り込み）
//! 3. 空でないクエリがあれば title か description の部分一致（大文字小文字無視）で絞る
//!
//! 並べ替えは安定ソートなので、同順位は index の順（新しく追加した順）を保ちます。
//! payload の解決は `resolve_all` で別に行い、1 件の失敗で一覧全体を壊しません。

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::domain::{
    ArtifactId, ArtifactRecord, AuthorBadge, CatalogCategory, CatalogQuery, EngagementStats,
    StorageError,
};
use crate::ports::{EngagementSource, FeaturedSource, PopularityRanker};
use crate::store::{BlobStore, DisplayRef};

/// 一覧の 1 件（payload はまだ解決していない）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub record: ArtifactRecord,
    pub stats: EngagementStats,
    pub featured: bool,
    pub author: AuthorBadge,
}

/// 表示用の 1 件。`display` は解決に失敗したら `None`
#[derive(Debug)]
pub struct DisplayItem {
    pub entry: CatalogEntry,
    pub display: Option<DisplayRef>,
}

impl DisplayItem {
    /// 表示をやめるときに呼ぶ
    pub fn release(self) {
        if let Some(display) = self.display {
            display.release();
        }
    }
}

pub struct Catalog {
    store: Arc<BlobStore>,
    ranker: Arc<dyn PopularityRanker>,
    featured: Arc<dyn FeaturedSource>,
    engagement: Arc<dyn EngagementSource>,
    author: AuthorBadge,
}

impl Catalog {
    pub fn new(
        store: Arc<BlobStore>,
        ranker: Arc<dyn PopularityRanker>,
        featured: Arc<dyn FeaturedSource>,
        engagement: Arc<dyn EngagementSource>,
    ) -> Self {
        let seed = rand::thread_rng().gen_range(0..1000);
        Self {
            store,
            ranker,
            featured,
            engagement,
            author: AuthorBadge::anonymous(seed),
        }
    }

    pub fn with_author(mut self, author: AuthorBadge) -> Self {
        self.author = author;
        self
    }

    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    fn entry(&self, record: ArtifactRecord) -> CatalogEntry {
        CatalogEntry {
            stats: self.engagement.stats_for(&record),
            featured: self.featured.is_featured(&record),
            author: self.author.clone(),
            record,
        }
    }

    /// カテゴリ → テキストの順に絞り込んだ一覧
    #[tracing::instrument(skip(self), fields(category = query.category.as_str()))]
    pub fn list_pitches(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, StorageError> {
        let records = self.store.list_all()?;
        let live: HashSet<ArtifactId> = records.iter().map(|record| record.id.clone()).collect();
        self.engagement.retain_only(&live);

        let mut entries: Vec<CatalogEntry> =
            records.into_iter().map(|record| self.entry(record)).collect();

        match query.category {
            CatalogCategory::All => {}
            CatalogCategory::Newest => {
                entries.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
            }
            CatalogCategory::Trending => {
                entries.sort_by(|a, b| self.ranker.compare(&a.record, &b.record));
            }
            CatalogCategory::Featured => entries.retain(|entry| entry.featured),
        }

        if let Some(needle) = query.normalized_text() {
            entries.retain(|entry| matches_text(&entry.record, &needle));
        }

        tracing::debug!(count = entries.len(), "catalog assembled");
        Ok(entries)
    }

    /// 1 件取得（解決はしない）
    pub fn get(&self, id: &ArtifactId) -> Result<Option<CatalogEntry>, StorageError> {
        Ok(self.store.get(id)?.map(|record| self.entry(record)))
    }

    /// 各 entry の payload を解決する。失敗した entry は `display: None` のまま残る
    pub async fn resolve_all(&self, entries: Vec<CatalogEntry>) -> Vec<DisplayItem> {
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let display = self.store.resolve(&entry.record.id).await;
            if display.is_none() {
                tracing::debug!(id = %entry.record.id, "listed without a playable reference");
            }
            items.push(DisplayItem { entry, display });
        }
        items
    }
}

/// `needle` は小文字化済み
fn matches_text(record: &ArtifactRecord, needle: &str) -> bool {
    record.title.to_lowercase().contains(needle)
        || record.description.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::domain::{BinaryPayload, NewArtifact};
    use crate::impls::{EngagementTable, InMemoryBinaryTier, InMemoryIndex, RandomEngagement};
    use crate::ports::BinaryTier;
    use crate::store::ObjectUrlRegistry;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    struct Fixture {
        binary: Arc<InMemoryBinaryTier>,
        catalog: Catalog,
    }

    /// Eco: featured, 5 likes, t1 / Foo: 50 likes, t2 > t1
    async fn eco_and_foo() -> Fixture {
        let binary = Arc::new(InMemoryBinaryTier::new());
        let store = Arc::new(BlobStore::new(
            binary.clone(),
            Arc::new(InMemoryIndex::new()),
            ObjectUrlRegistry::new(),
            StoreConfig::default(),
        ));
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        // Foo is saved first so that index order differs from date order
        for (id, title, description, created_at) in [
            ("foo", "Foo", "Fintech for bakeries", t1 + Duration::days(2)),
            ("eco", "Eco", "Compostable packaging", t1),
        ] {
            store
                .save(NewArtifact {
                    id: ArtifactId::new(id),
                    title: title.to_string(),
                    description: description.to_string(),
                    payload: BinaryPayload::new(id.as_bytes().to_vec(), "video/webm"),
                    created_at,
                })
                .await
                .unwrap();
        }

        let table = Arc::new(
            EngagementTable::new()
                .with_likes("eco", 5)
                .with_likes("foo", 50)
                .feature("eco"),
        );
        let catalog = Catalog::new(store, table.clone(), table.clone(), table)
            .with_author(AuthorBadge::anonymous(7));
        Fixture { binary, catalog }
    }

    fn titles(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.record.title.as_str()).collect()
    }

    #[rstest]
    #[case(CatalogCategory::All, vec!["Eco", "Foo"])]
    #[case(CatalogCategory::Featured, vec!["Eco"])]
    #[case(CatalogCategory::Trending, vec!["Foo", "Eco"])]
    #[case(CatalogCategory::Newest, vec!["Foo", "Eco"])]
    #[tokio::test]
    async fn test_category_selection(
        #[case] category: CatalogCategory,
        #[case] expected: Vec<&str>,
    ) {
        let f = eco_and_foo().await;
        let entries = f.catalog.list_pitches(&CatalogQuery::new(category)).unwrap();
        assert_eq!(titles(&entries), expected);
    }

    #[rstest]
    #[case(CatalogCategory::All, "eco", vec!["Eco"])]
    #[case(CatalogCategory::All, "ECO", vec!["Eco"])]
    #[case(CatalogCategory::All, "bakeries", vec!["Foo"])]
    #[case(CatalogCategory::All, "", vec!["Eco", "Foo"])]
    #[case(CatalogCategory::Featured, "foo", vec![])]
    #[case(CatalogCategory::Trending, "o", vec!["Foo", "Eco"])]
    #[tokio::test]
    async fn test_text_filter_narrows_category(
        #[case] category: CatalogCategory,
        #[case] text: &str,
        #[case] expected: Vec<&str>,
    ) {
        let f = eco_and_foo().await;
        let query = CatalogQuery::new(category).with_text(text);
        let entries = f.catalog.list_pitches(&query).unwrap();
        assert_eq!(titles(&entries), expected);
    }

    #[tokio::test]
    async fn test_entries_carry_stats_and_author() {
        let f = eco_and_foo().await;
        let eco = f.catalog.get(&"eco".into()).unwrap().unwrap();

        assert_eq!(eco.stats.likes, 5);
        assert!(eco.featured);
        assert_eq!(eco.author.name, "Anonymous Founder");
        assert_eq!(eco.author.avatar, "https://avatar.vercel.sh/anonymous-7.png");
        assert!(f.catalog.get(&"missing".into()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unresolvable_item_is_still_listed() {
        let f = eco_and_foo().await;
        f.binary.delete(&"eco".into()).await.unwrap();

        let entries = f.catalog.list_pitches(&CatalogQuery::default()).unwrap();
        let items = f.catalog.resolve_all(entries).await;

        assert_eq!(items.len(), 2);
        assert!(items[0].display.is_none());
        let foo = items[1].display.as_ref().unwrap();
        let payload = f.catalog.store().urls().lookup(foo.url()).unwrap();
        assert_eq!(payload.bytes().as_ref(), b"foo");

        for item in items {
            item.release();
        }
        assert_eq!(f.catalog.store().urls().live_count(), 0);
    }

    #[tokio::test]
    async fn test_listing_evicts_stats_of_removed_items() {
        let f = eco_and_foo().await;
        let random = Arc::new(RandomEngagement::new());
        let catalog = Catalog::new(
            f.catalog.store().clone(),
            random.clone(),
            random.clone(),
            random.clone(),
        );

        catalog.list_pitches(&CatalogQuery::default()).unwrap();
        assert_eq!(random.drawn_count(), 2);

        catalog.store().remove(&"eco".into()).await.unwrap();
        catalog.list_pitches(&CatalogQuery::default()).unwrap();
        assert_eq!(random.drawn_count(), 1);
    }

    #[tokio::test]
    async fn test_ties_keep_index_order() {
        let f = eco_and_foo().await;
        let flat = Arc::new(|_: &ArtifactRecord, _: &ArtifactRecord| std::cmp::Ordering::Equal);
        let catalog = Catalog::new(
            f.catalog.store().clone(),
            flat,
            Arc::new(|_: &ArtifactRecord| false),
            Arc::new(EngagementTable::new()),
        );

        let entries = catalog
            .list_pitches(&CatalogQuery::new(CatalogCategory::Trending))
            .unwrap();
        assert_eq!(titles(&entries), vec!["Eco", "Foo"]);
    }
}
