//! Errors - エラー型と分類
//!
//! # 分類（ErrorKind）
//! UI 層はエラーの「種類」だけを見て表示（toast, banner）を決めます。
//! 各エラー型は `kind()` で ErrorKind に写像されます。
//!
//! - デバイス系: PermissionDenied, DeviceUnavailable
//! - 入力系: InvalidMediaFormat, ValidationError
//! - ストレージ系: StorageUnavailable, StorageQuotaExceeded, NotFound
//! - OrphanedReference: metadata はあるが payload が無い。
//!   ログ上でのみ区別し、呼び出し側には NotFound として返す

use thiserror::Error;

use super::ids::ArtifactId;

/// ErrorKind は UI 層に見せるエラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PermissionDenied,
    DeviceUnavailable,
    InvalidMediaFormat,
    ValidationError,
    StorageUnavailable,
    StorageQuotaExceeded,
    NotFound,
    OrphanedReference,
}

/// StorageError は binary tier / metadata index の操作エラー
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage engine unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("artifact not found: {0}")]
    NotFound(ArtifactId),

    #[error("failed to encode metadata index: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Unavailable(_) | StorageError::Encode(_) => ErrorKind::StorageUnavailable,
            StorageError::QuotaExceeded(_) => ErrorKind::StorageQuotaExceeded,
            StorageError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// std::io::Error を StorageError に変換（filesystem backend 用）
    pub(crate) fn from_io(context: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::StorageFull => {
                StorageError::QuotaExceeded(format!("{context}: {err}"))
            }
            _ => StorageError::Unavailable(format!("{context}: {err}")),
        }
    }
}

/// ValidationError は保存前の入力チェックの失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a title is required")]
    MissingTitle,

    #[error("title is {actual} characters long (max {max})")]
    TitleTooLong { max: usize, actual: usize },

    #[error("description is {actual} characters long (max {max})")]
    DescriptionTooLong { max: usize, actual: usize },

    #[error("nothing has been captured or selected yet")]
    MissingPayload,
}

/// CaptureError は capture session の遷移エラー
///
/// どの variant でも、session は Idle に戻るか元の状態に留まります
/// （デバイスの半端な確保は残らない）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("camera/microphone access was denied: {0}")]
    PermissionDenied(String),

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("invalid file format: {mime_type:?} is not a video")]
    InvalidMediaFormat { mime_type: String },

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CaptureError::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            CaptureError::InvalidMediaFormat { .. } => ErrorKind::InvalidMediaFormat,
            CaptureError::InvalidTransition { .. } => ErrorKind::ValidationError,
        }
    }
}

/// PitchboxError はクレート全体のエラー（UI 層との境界）
#[derive(Debug, Error)]
pub enum PitchboxError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl PitchboxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PitchboxError::Storage(e) => e.kind(),
            PitchboxError::Capture(e) => e.kind(),
            PitchboxError::Validation(_) | PitchboxError::Config(_) => ErrorKind::ValidationError,
        }
    }
}
