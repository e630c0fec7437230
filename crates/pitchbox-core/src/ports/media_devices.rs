//! MediaDevices port - カメラ/マイクと録画器の抽象化
//!
//! # 三層構造
//! - **MediaDevices**: デバイスへのアクセス要求（許可ダイアログなど）
//! - **DeviceStream**: 確保済みのストリーム（video/audio track の集合）
//! - **Recorder**: ストリームから byte fragment を順番に吐き出す録画器
//!
//! # リソース規律
//! - DeviceStream は Drop 時に残っている track をすべて止めること
//! - Recorder は Drop 時に録画を止めること
//! - capture session は Recording を抜けるすべての経路でこれらを解放する

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::CaptureError;

/// Which devices to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub video: bool,
    pub audio: bool,
}

impl StreamRequest {
    pub fn camera_and_microphone() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// DeviceError はデバイス確保・録画開始の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("device unavailable: {0}")]
    Unavailable(String),
}

impl From<DeviceError> for CaptureError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied(msg) => CaptureError::PermissionDenied(msg),
            DeviceError::Unavailable(msg) => CaptureError::DeviceUnavailable(msg),
        }
    }
}

/// MediaDevices はカメラ+マイクのストリームを開く
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn open_stream(
        &self,
        request: StreamRequest,
    ) -> Result<Box<dyn DeviceStream>, DeviceError>;
}

/// DeviceStream は確保済みのデバイスストリーム
pub trait DeviceStream: Send {
    /// まだ動いている track の数
    fn live_tracks(&self) -> usize;

    /// すべての track を止める（何度呼んでもよい）
    fn stop_tracks(&mut self);

    /// このストリームを入力にした録画器を起動
    fn start_recorder(&mut self, mime_type: &str) -> Result<Box<dyn Recorder>, DeviceError>;
}

/// Recorder は fragment を捕捉順に渡す
#[async_trait]
pub trait Recorder: Send {
    fn mime_type(&self) -> &str;

    /// 次の fragment を待つ。入力が終わったら `None`
    ///
    /// `tokio::select!` の分岐で使うため cancel-safe であること。
    async fn next_fragment(&mut self) -> Option<Bytes>;

    /// 録画を止め、まだ渡していない fragment を順番通りに返す
    ///
    /// 途中で放棄された場合、次の呼び出しで残りを返せること。
    async fn finish(&mut self) -> Vec<Bytes>;

    /// 録画を破棄して止める（fragment は返さない）
    fn abort(&mut self);
}
