//! Store - artifact の永続化と一時 URL
//!
//! - **BlobStore**: binary tier + metadata index の二層ストア
//! - **ObjectUrlRegistry / DisplayRef**: 取り消し可能な表示用参照

pub mod blob_store;
pub mod display;

pub use self::blob_store::BlobStore;
pub use self::display::{DisplayRef, ObjectUrlRegistry};
