//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryBinaryTier / InMemoryIndex**: 開発・テスト用のストレージ
//! - **FsBinaryTier / JsonFileIndex**: ファイルに保存する（リロード後も残る）
//! - **FakeMediaDevices**: 台本どおりのカメラ/マイク
//! - **SimulatedEngine / SimulatedFullscreen**: 時間を手で進める再生エンジン
//! - **EngagementTable / RandomEngagement**: 一覧用の表示カウンタ

pub mod curation;
pub mod fake_devices;
pub mod file_index;
pub mod fs_binary;
pub mod inmem_binary;
pub mod inmem_index;
pub mod simulated_engine;

// 主要な型を再エクスポート
pub use self::curation::{EngagementTable, RandomEngagement};
pub use self::fake_devices::{AccessMode, FakeMediaDevices};
pub use self::file_index::JsonFileIndex;
pub use self::fs_binary::FsBinaryTier;
pub use self::inmem_binary::InMemoryBinaryTier;
pub use self::inmem_index::InMemoryIndex;
pub use self::simulated_engine::{SimulatedEngine, SimulatedFullscreen};
