//! Catalog - 保存済み artifact の一覧（絞り込み・並べ替え・解決）

pub mod assembler;

pub use self::assembler::{Catalog, CatalogEntry, DisplayItem};
