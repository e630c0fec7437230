//! Domain identifiers.
//!
//! # ArtifactId
//! artifact の ID は呼び出し側が生成する不透明な文字列です。
//! 生成方法（ULID、タイムスタンプなど）は `IdGenerator` port に任せ、
//! ここでは衝突検知も形式検証も行いません（衝突は呼び出し側のバグ）。
//!
//! `#[serde(transparent)]` により、metadata index の JSON には
//! ただの文字列として保存されます。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a stored artifact (recorded or uploaded video).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// ULID から ArtifactId を作成（文字列表現をそのまま使う）
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ArtifactId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ArtifactId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<Ulid> for ArtifactId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
