//! SimulatedEngine - 時間を手で進める再生エンジン（CLI・テスト用）

use crate::ports::{EngineError, FullscreenHost, PlaybackEngine};

/// SimulatedEngine は `advance` で再生位置を進める
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngine {
    paused: bool,
    current_time: f64,
    duration: Option<f64>,
    muted: bool,
    block_play: bool,
    ended: bool,
}

impl SimulatedEngine {
    /// metadata 読み込み前のエンジン
    pub fn new() -> Self {
        Self {
            paused: true,
            ..Self::default()
        }
    }

    /// 総再生時間がわかっているエンジン
    pub fn with_duration(duration_secs: f64) -> Self {
        let mut engine = Self::new();
        engine.load_metadata(duration_secs);
        engine
    }

    pub fn load_metadata(&mut self, duration_secs: f64) {
        self.duration = Some(duration_secs.max(0.0));
    }

    /// autoplay 制限などで `play()` を拒否させる
    pub fn block_play(&mut self, block: bool) {
        self.block_play = block;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// 再生中なら `secs` だけ進める。末尾に達したら一時停止して `true`
    pub fn advance(&mut self, secs: f64) -> bool {
        if self.paused {
            return false;
        }
        let end = self.duration.unwrap_or(f64::INFINITY);
        self.current_time = (self.current_time + secs).min(end);
        if self.current_time >= end {
            self.paused = true;
            self.ended = true;
            return true;
        }
        false
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn play(&mut self) -> Result<(), EngineError> {
        if self.block_play {
            return Err(EngineError("play() was blocked by the host".into()));
        }
        if self.ended {
            self.current_time = 0.0;
            self.ended = false;
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let end = self.duration.unwrap_or(0.0);
        self.current_time = seconds.clamp(0.0, end);
        self.ended = false;
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// SimulatedFullscreen は document の fullscreen 状態を真似る
#[derive(Debug, Clone, Default)]
pub struct SimulatedFullscreen {
    active: bool,
    deny: bool,
}

impl SimulatedFullscreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_requests(&mut self, deny: bool) {
        self.deny = deny;
    }

    /// Esc キーなど、controller を通らない解除
    pub fn exit_externally(&mut self) {
        self.active = false;
    }
}

impl FullscreenHost for SimulatedFullscreen {
    fn is_fullscreen(&self) -> bool {
        self.active
    }

    fn request_fullscreen(&mut self) -> Result<(), EngineError> {
        if self.deny {
            return Err(EngineError("fullscreen request denied".into()));
        }
        self.active = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_stops_at_the_end() {
        let mut engine = SimulatedEngine::with_duration(10.0);
        engine.play().unwrap();
        assert!(!engine.advance(4.0));
        assert!(engine.advance(7.0));
        assert_eq!(engine.current_time(), 10.0);
        assert!(engine.is_paused());
        assert!(engine.has_ended());
    }

    #[test]
    fn play_after_end_restarts() {
        let mut engine = SimulatedEngine::with_duration(1.0);
        engine.play().unwrap();
        engine.advance(2.0);
        engine.play().unwrap();
        assert_eq!(engine.current_time(), 0.0);
    }

    #[test]
    fn seek_without_metadata_stays_at_zero() {
        let mut engine = SimulatedEngine::new();
        engine.set_current_time(12.0);
        assert_eq!(engine.current_time(), 0.0);
    }
}
