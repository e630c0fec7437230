//! Domain model (ids, artifacts, listing filters, errors).
//!
//! I/O を一切持たないデータ型だけを置きます。
//! 外部システムとのやり取りは `ports` を経由します。

pub mod artifact;
pub mod errors;
pub mod ids;
pub mod listing;

pub use self::artifact::{
    ArtifactRecord, BinaryPayload, FieldLimits, NewArtifact, is_accepted_media_type,
};
pub use self::errors::{CaptureError, ErrorKind, PitchboxError, StorageError, ValidationError};
pub use self::ids::ArtifactId;
pub use self::listing::{AuthorBadge, CatalogCategory, CatalogQuery, EngagementStats};
