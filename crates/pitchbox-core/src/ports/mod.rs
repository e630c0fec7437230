//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（ストレージエンジン、カメラ/マイク、video 要素など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - payload は BinaryTier（非同期・大容量）
//! - metadata は MetadataIndex（同期・小容量）
//! - デバイスと再生エンジンは host 環境が実装する

pub mod binary_tier;
pub mod clock;
pub mod curation;
pub mod id_generator;
pub mod media_devices;
pub mod metadata_index;
pub mod playback_engine;

// 主要な trait を再エクスポート
pub use self::binary_tier::BinaryTier;
pub use self::clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use self::curation::{EngagementSource, FeaturedSource, PopularityRanker};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::media_devices::{DeviceError, DeviceStream, MediaDevices, Recorder, StreamRequest};
pub use self::metadata_index::MetadataIndex;
pub use self::playback_engine::{EngineError, FullscreenHost, PlaybackEngine};
