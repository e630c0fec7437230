//! MetadataIndex port - 小さな key-value ストア（localStorage 相当）
//!
//! metadata index は固定の namespace key の下に JSON 文字列として置かれます。
//! 操作はすべて同期的で、一覧表示のたびに読まれます。

use crate::domain::StorageError;

/// MetadataIndex は文字列の key-value ストア
///
/// # 実装
/// - `InMemoryIndex`（開発・テスト用、quota を設定可能）
/// - `JsonFileIndex`（1 ファイルの JSON object）
pub trait MetadataIndex: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
