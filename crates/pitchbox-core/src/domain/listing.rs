//! Listing model: catalog filters and display-only stand-ins.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category selection applied before the free-text filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogCategory {
    /// Index order (newest insertion first).
    #[default]
    All,
    /// Injected popularity ranking, best first.
    Trending,
    /// `created_at` descending.
    Newest,
    /// Subset flagged by the injected feature source.
    Featured,
}

impl CatalogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogCategory::All => "all",
            CatalogCategory::Trending => "trending",
            CatalogCategory::Newest => "newest",
            CatalogCategory::Featured => "featured",
        }
    }
}

impl FromStr for CatalogCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(CatalogCategory::All),
            "trending" => Ok(CatalogCategory::Trending),
            "newest" => Ok(CatalogCategory::Newest),
            "featured" => Ok(CatalogCategory::Featured),
            other => Err(format!("unknown catalog filter: {other}")),
        }
    }
}

/// Category + optional free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: CatalogCategory,
    pub text: Option<String>,
}

impl CatalogQuery {
    pub fn new(category: CatalogCategory) -> Self {
        Self {
            category,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// 空文字のクエリは「フィルタなし」と同じ（小文字化して返す）
    pub fn normalized_text(&self) -> Option<String> {
        self.text
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }
}

/// Engagement counters shown next to an item.
///
/// These are display stand-ins, not computed analytics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub likes: u32,
    pub comments: u32,
    pub views: u32,
}

/// Author shown on a card. Every local artifact is anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorBadge {
    pub name: String,
    pub avatar: String,
}

impl AuthorBadge {
    pub fn anonymous(seed: u32) -> Self {
        Self {
            name: "Anonymous Founder".to_string(),
            avatar: format!("https://avatar.vercel.sh/anonymous-{seed}.png"),
        }
    }
}
