//! PlaybackEngine port - 実際の再生エンジン（host の video 要素）
//!
//! 再生/一時停止の「正本」はエンジン側です。
//! PlaybackController のフラグはエンジンの状態を写すだけです。

/// EngineError は再生エンジンや fullscreen 要求の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("playback engine error: {0}")]
pub struct EngineError(pub String);

/// PlaybackEngine は display reference を実際に再生するもの
pub trait PlaybackEngine: Send {
    /// 再生開始（autoplay 制限などで拒否されることがある）
    fn play(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// 現在位置（秒）
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// 総再生時間（秒）。metadata 読み込み前は `None`
    fn duration(&self) -> Option<f64>;

    fn set_muted(&mut self, muted: bool);
}

/// FullscreenHost は host 環境の fullscreen API
///
/// Esc キーなど、controller を経由しない fullscreen 解除もあり得るので、
/// host は変化を `PlaybackController::on_fullscreen_change` で通知する。
pub trait FullscreenHost: Send {
    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&mut self) -> Result<(), EngineError>;

    fn exit_fullscreen(&mut self);
}
