//! Filesystem binary tier.
//!
//! One file per record: `{root}/{escaped id}.record`.
//! A record file is a one-line JSON header followed by the raw payload:
//!
//! ```text
//! {"id":"01HV...","mimeType":"video/webm","size":524288}\n
//! <524288 payload bytes>
//! ```
//!
//! Writes go to a temp file first and are renamed into place, so a failed
//! write never leaves a half-written record behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ArtifactId, BinaryPayload, StorageError};
use crate::ports::BinaryTier;

const RECORD_EXTENSION: &str = "record";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordHeader {
    id: ArtifactId,
    mime_type: String,
    size: usize,
}

/// Filesystem storage for payloads.
#[derive(Debug, Clone)]
pub struct FsBinaryTier {
    root: PathBuf,
}

impl FsBinaryTier {
    /// Create the tier, creating `root` if it does not exist.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| StorageError::from_io(&format!("create {}", root.display()), e))?;
        tracing::debug!(path = %root.display(), "opened filesystem binary tier");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &ArtifactId) -> PathBuf {
        self.root
            .join(format!("{}.{RECORD_EXTENSION}", escape_file_name(id.as_str())))
    }
}

/// Ids are caller supplied; anything outside `[A-Za-z0-9_-]` is percent-escaped
/// so an id can never leave the root directory.
fn escape_file_name(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

fn decode_record(path: &Path, raw: Vec<u8>) -> Result<BinaryPayload, StorageError> {
    let corrupt = |reason: &str| {
        StorageError::Unavailable(format!("corrupt record {}: {reason}", path.display()))
    };
    let split = raw
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| corrupt("missing header"))?;
    let header: RecordHeader =
        serde_json::from_slice(&raw[..split]).map_err(|e| corrupt(&e.to_string()))?;
    let body = &raw[split + 1..];
    if body.len() != header.size {
        return Err(corrupt(&format!(
            "expected {} payload bytes, found {}",
            header.size,
            body.len()
        )));
    }
    Ok(BinaryPayload::new(body.to_vec(), header.mime_type))
}

#[async_trait]
impl BinaryTier for FsBinaryTier {
    #[tracing::instrument(skip(self, payload), fields(size = payload.len()))]
    async fn put(&self, id: &ArtifactId, payload: &BinaryPayload) -> Result<(), StorageError> {
        let header = RecordHeader {
            id: id.clone(),
            mime_type: payload.mime_type().to_string(),
            size: payload.len(),
        };
        let mut contents = serde_json::to_vec(&header)?;
        contents.push(b'\n');
        contents.extend_from_slice(payload.bytes());

        let path = self.record_path(id);
        let tmp = path.with_extension("tmp");
        if let Err(e) = tokio::fs::write(&tmp, &contents).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::from_io(&format!("write {}", tmp.display()), e));
        }
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::from_io(&format!("rename {}", path.display()), e))?;
        Ok(())
    }

    async fn get(&self, id: &ArtifactId) -> Result<Option<BinaryPayload>, StorageError> {
        let path = self.record_path(id);
        match tokio::fs::read(&path).await {
            Ok(raw) => decode_record(&path, raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_io(&format!("read {}", path.display()), e)),
        }
    }

    async fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        let path = self.record_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_io(&format!("remove {}", path.display()), e)),
        }
    }
}
