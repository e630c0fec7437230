//! pitchbox-core
//!
//! Local video capture and storage for short pitch recordings.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, artifact, listing, errors）
//! - **ports**: 抽象化レイヤー（BinaryTier, MetadataIndex, MediaDevices, PlaybackEngine, Clock, curation）
//! - **impls**: 実装（in-memory / filesystem ストレージ、fake デバイス、simulated engine）
//! - **store**: 二層 BlobStore と取り消し可能な display reference
//! - **capture**: 録画・ファイル選択の状態機械
//! - **playback**: player の操作状態（seek, mute, fullscreen, controls の auto-hide）
//! - **catalog**: 一覧の組み立て（カテゴリ + テキスト検索）
//! - **app**: AppBuilder による組み立て
//! - **config**: TOML 設定

pub mod app;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod impls;
pub mod playback;
pub mod ports;
pub mod store;

pub use crate::app::{App, AppBuilder, BuildError};
pub use crate::config::PitchboxConfig;
pub use crate::domain::{ErrorKind, PitchboxError};
