//! App - 部品の組み立て
//!
//! - **AppBuilder**: ストレージ・時計・ID 生成・curation を受け取り、起動時に検証する
//! - **App**: BlobStore / Catalog を保持し、capture session と player を作る

pub mod builder;

pub use self::builder::{App, AppBuilder, BuildError};
