//! Artifact model: metadata record + binary payload.
//!
//! # 二層構造
//! - **ArtifactRecord**: metadata index に入る軽量なレコード（payload は持たない）
//! - **BinaryPayload**: binary tier にだけ保存される生データ + MIME type
//!
//! index は一覧表示のたびに全件読むので小さく保ち、
//! payload は resolve 時に 1 件ずつ取り出します。

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::ids::ArtifactId;

/// Metadata record persisted in the metadata index.
///
/// Field names match the on-disk layout `{id, title, description, binaryRef, createdAt}`.
/// Older indexes wrote `blobUrl` and `date`; both are still accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub id: ArtifactId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "blobUrl")]
    pub binary_ref: String,
    #[serde(alias = "date")]
    pub created_at: DateTime<Utc>,
}

/// Raw bytes + MIME type tag. Owned by the binary tier only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    bytes: Bytes,
    mime_type: String,
}

impl BinaryPayload {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// fragment を到着順に連結して 1 つの payload にする
    ///
    /// 順序だけが正しさの条件（中身は検査しない）。
    pub fn concat<'a>(
        fragments: impl IntoIterator<Item = &'a Bytes>,
        mime_type: impl Into<String>,
    ) -> Self {
        let mut buf = BytesMut::new();
        for fragment in fragments {
            buf.extend_from_slice(fragment);
        }
        Self::new(buf.freeze(), mime_type)
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Is `mime_type` accepted as a video artifact?
///
/// Matching is a case-insensitive prefix test (`video/` by default).
pub fn is_accepted_media_type(mime_type: &str, accepted_prefix: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    let prefix = accepted_prefix.to_ascii_lowercase();
    !prefix.is_empty() && mime.starts_with(&prefix) && mime.len() > prefix.len()
}

/// Input of `BlobStore::save`.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub id: ArtifactId,
    pub title: String,
    pub description: String,
    pub payload: BinaryPayload,
    pub created_at: DateTime<Utc>,
}

/// Length limits applied before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    pub title_max_chars: usize,
    pub description_max_chars: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            title_max_chars: 60,
            description_max_chars: 200,
        }
    }
}

impl NewArtifact {
    /// title（必須・上限あり）と description（任意・上限あり）を検証
    pub fn validate(&self, limits: FieldLimits) -> Result<(), ValidationError> {
        let title_len = self.title.trim().chars().count();
        if title_len == 0 {
            return Err(ValidationError::MissingTitle);
        }
        if title_len > limits.title_max_chars {
            return Err(ValidationError::TitleTooLong {
                max: limits.title_max_chars,
                actual: title_len,
            });
        }
        let description_len = self.description.chars().count();
        if description_len > limits.description_max_chars {
            return Err(ValidationError::DescriptionTooLong {
                max: limits.description_max_chars,
                actual: description_len,
            });
        }
        Ok(())
    }

    /// metadata index に入れるレコードを作る（payload は含めない）
    pub fn to_record(&self, binary_ref: String) -> ArtifactRecord {
        ArtifactRecord {
            id: self.id.clone(),
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            binary_ref,
            created_at: self.created_at,
        }
    }
}
