//! PlaybackController - 再生エンジンの上に載る操作レイヤー
//!
//! # 設計原則
//! - 再生/一時停止の正本はエンジン。`playing` はエンジンの状態を写すだけ
//! - fullscreen の正本は host。外部で解除されたら `on_fullscreen_change` で合わせる
//! - controls の表示:
//!   - pointer 操作があれば表示し、idle タイマーをやり直す
//!   - 一時停止中は常に表示
//!   - 再生中は `controls_idle` の間操作が無ければ `tick` で隠す
//!
//! player ごとに 1 つ作ります。player 同士は状態を共有しません。

use chrono::{DateTime, Utc};

use crate::config::PlaybackConfig;
use crate::ports::{Clock, EngineError, FullscreenHost, PlaybackEngine};

use super::keys::KeyCommand;
use super::time::format_time;

/// UI に渡すスナップショット
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub position: f64,
    pub duration: Option<f64>,
    pub playing: bool,
    pub muted: bool,
    pub fullscreen: bool,
    pub controls_visible: bool,
}

pub struct PlaybackController<E, F, C> {
    engine: E,
    fullscreen_host: F,
    clock: C,
    config: PlaybackConfig,
    state: PlaybackState,
    last_activity: DateTime<Utc>,
}

impl<E, F, C> PlaybackController<E, F, C>
where
    E: PlaybackEngine,
    F: FullscreenHost,
    C: Clock,
{
    pub fn new(engine: E, fullscreen_host: F, clock: C, config: PlaybackConfig) -> Self {
        let state = PlaybackState {
            position: engine.current_time(),
            duration: engine.duration(),
            playing: !engine.is_paused(),
            muted: false,
            fullscreen: fullscreen_host.is_fullscreen(),
            controls_visible: true,
        };
        let last_activity = clock.now();
        Self {
            engine,
            fullscreen_host,
            clock,
            config,
            state,
            last_activity,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn fullscreen_host_mut(&mut self) -> &mut F {
        &mut self.fullscreen_host
    }

    /// 再生 ⇄ 一時停止
    pub fn toggle_play(&mut self) -> Result<(), EngineError> {
        let result = if self.engine.is_paused() {
            self.engine.play()
        } else {
            self.engine.pause();
            Ok(())
        };
        self.state.playing = !self.engine.is_paused();
        self.register_activity();
        if let Err(e) = &result {
            tracing::warn!(error = %e, "play request rejected");
        }
        result
    }

    /// `fraction * duration` に移動（fraction は [0, 1] に丸める）
    ///
    /// duration が未確定なら何もしない。
    pub fn seek(&mut self, fraction: f64) {
        let Some(duration) = self.known_duration() else {
            return;
        };
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.move_to(fraction * duration);
        self.register_activity();
    }

    /// 現在位置から `delta` 秒動かす（[0, duration] に丸める）
    pub fn seek_by(&mut self, delta: f64) {
        let Some(duration) = self.known_duration() else {
            return;
        };
        let target = (self.state.position + delta).clamp(0.0, duration);
        self.move_to(target);
        self.register_activity();
    }

    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        self.engine.set_muted(self.state.muted);
        self.register_activity();
    }

    pub fn toggle_fullscreen(&mut self) -> Result<(), EngineError> {
        let result = if self.fullscreen_host.is_fullscreen() {
            self.fullscreen_host.exit_fullscreen();
            Ok(())
        } else {
            self.fullscreen_host.request_fullscreen()
        };
        self.state.fullscreen = self.fullscreen_host.is_fullscreen();
        self.register_activity();
        if let Err(e) = &result {
            tracing::warn!(error = %e, "fullscreen request rejected");
        }
        result
    }

    /// host からの fullscreen 変化通知（Esc キーなど）
    pub fn on_fullscreen_change(&mut self) {
        self.state.fullscreen = self.fullscreen_host.is_fullscreen();
        self.refresh_controls();
    }

    pub fn on_metadata_loaded(&mut self) {
        self.state.duration = self.engine.duration();
        self.refresh_controls();
    }

    pub fn on_time_update(&mut self) {
        self.state.position = self.engine.current_time();
        self.state.playing = !self.engine.is_paused();
        self.refresh_controls();
    }

    /// 末尾に到達した
    pub fn on_ended(&mut self) {
        self.state.position = self.engine.current_time();
        self.state.playing = false;
        self.refresh_controls();
    }

    /// pointer が動いた（表示して idle タイマーをやり直す）
    pub fn pointer_activity(&mut self) {
        self.register_activity();
    }

    /// pointer が player から出た。再生中ならすぐ隠す
    pub fn pointer_leave(&mut self) {
        if self.state.playing {
            self.state.controls_visible = false;
        }
    }

    /// 定期的に呼ぶ。再生中に idle 時間を超えたら controls を隠す
    pub fn tick(&mut self) {
        if !self.state.playing {
            self.state.controls_visible = true;
            return;
        }
        let idle = self.clock.now() - self.last_activity;
        if idle >= self.config.controls_idle() {
            self.state.controls_visible = false;
        }
    }

    /// キー入力。反応したら `Ok(true)`
    pub fn handle_key(&mut self, key: &str) -> Result<bool, EngineError> {
        let Some(command) = KeyCommand::from_key(key) else {
            return Ok(false);
        };
        match command {
            KeyCommand::TogglePlay => self.toggle_play()?,
            KeyCommand::ToggleMute => self.toggle_mute(),
            KeyCommand::ToggleFullscreen => self.toggle_fullscreen()?,
            KeyCommand::SeekForward => self.seek_by(self.config.seek_step_secs),
            KeyCommand::SeekBackward => self.seek_by(-self.config.seek_step_secs),
        }
        Ok(true)
    }

    /// progress bar の幅（0〜100）
    pub fn progress_percent(&self) -> f64 {
        match self.known_duration() {
            Some(duration) if duration > 0.0 => {
                (self.state.position / duration * 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        }
    }

    /// `"0:20 / 0:40"`
    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.state.position),
            format_time(self.state.duration.unwrap_or(0.0))
        )
    }

    fn known_duration(&self) -> Option<f64> {
        self.state.duration.filter(|d| d.is_finite() && *d >= 0.0)
    }

    fn move_to(&mut self, seconds: f64) {
        self.engine.set_current_time(seconds);
        self.state.position = seconds;
    }

    fn register_activity(&mut self) {
        self.last_activity = self.clock.now();
        self.state.controls_visible = true;
    }

    fn refresh_controls(&mut self) {
        if !self.state.playing {
            self.state.controls_visible = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{SimulatedEngine, SimulatedFullscreen};
    use crate::ports::ManualClock;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    type Controller = PlaybackController<SimulatedEngine, SimulatedFullscreen, ManualClock>;

    fn controller(duration: f64) -> (Controller, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let controller = PlaybackController::new(
            SimulatedEngine::with_duration(duration),
            SimulatedFullscreen::new(),
            clock.clone(),
            PlaybackConfig::default(),
        );
        (controller, clock)
    }

    #[rstest]
    #[case(0.5, 20.0)]
    #[case(1.5, 40.0)]
    #[case(-0.2, 0.0)]
    #[case(0.0, 0.0)]
    #[case(1.0, 40.0)]
    fn test_seek_maps_fraction_to_time(#[case] fraction: f64, #[case] expected: f64) {
        let (mut player, _) = controller(40.0);
        player.seek(fraction);
        assert_eq!(player.state().position, expected);
        assert_eq!(player.engine().current_time(), expected);
    }

    #[test]
    fn test_seek_before_metadata_is_ignored() {
        let clock = ManualClock::new(Utc::now());
        let mut player = PlaybackController::new(
            SimulatedEngine::new(),
            SimulatedFullscreen::new(),
            clock,
            PlaybackConfig::default(),
        );
        player.seek(0.5);
        assert_eq!(player.state().position, 0.0);

        player.engine_mut().load_metadata(10.0);
        player.on_metadata_loaded();
        player.seek(0.5);
        assert_eq!(player.state().position, 5.0);
    }

    #[test]
    fn test_toggle_play_mirrors_engine() {
        let (mut player, _) = controller(40.0);
        assert!(!player.state().playing);

        player.toggle_play().unwrap();
        assert!(player.state().playing);
        assert!(!player.engine().is_paused());

        player.toggle_play().unwrap();
        assert!(!player.state().playing);
        assert!(player.engine().is_paused());
    }

    #[test]
    fn test_blocked_play_keeps_flag_false() {
        let (mut player, _) = controller(40.0);
        player.engine_mut().block_play(true);

        assert!(player.toggle_play().is_err());
        assert!(!player.state().playing);
    }

    #[rstest]
    #[case("ArrowRight", 15.0)]
    #[case("ArrowLeft", 5.0)]
    fn test_arrow_keys_seek_five_seconds(#[case] key: &str, #[case] expected: f64) {
        let (mut player, _) = controller(40.0);
        player.seek(0.25);
        assert!(player.handle_key(key).unwrap());
        assert_eq!(player.state().position, expected);
    }

    #[test]
    fn test_keyboard_seek_is_clamped() {
        let (mut player, _) = controller(8.0);
        player.handle_key("ArrowLeft").unwrap();
        assert_eq!(player.state().position, 0.0);

        player.seek(0.75);
        player.handle_key("ArrowRight").unwrap();
        assert_eq!(player.state().position, 8.0);
    }

    #[test]
    fn test_keys_toggle_play_mute_and_fullscreen() {
        let (mut player, _) = controller(40.0);

        assert!(player.handle_key(" ").unwrap());
        assert!(player.state().playing);
        assert!(player.handle_key("k").unwrap());
        assert!(!player.state().playing);

        player.handle_key("m").unwrap();
        assert!(player.state().muted);
        assert!(player.engine().is_muted());

        player.handle_key("f").unwrap();
        assert!(player.state().fullscreen);

        assert!(!player.handle_key("q").unwrap());
    }

    #[test]
    fn test_external_fullscreen_exit_is_reconciled() {
        let (mut player, _) = controller(40.0);
        player.toggle_fullscreen().unwrap();
        assert!(player.state().fullscreen);

        player.fullscreen_host_mut().exit_externally();
        player.on_fullscreen_change();
        assert!(!player.state().fullscreen);

        // the next toggle enters fullscreen again instead of exiting
        player.toggle_fullscreen().unwrap();
        assert!(player.state().fullscreen);
    }

    #[test]
    fn test_denied_fullscreen_leaves_flag_false() {
        let (mut player, _) = controller(40.0);
        player.fullscreen_host_mut().deny_requests(true);

        assert!(player.toggle_fullscreen().is_err());
        assert!(!player.state().fullscreen);
    }

    #[test]
    fn test_controls_hide_after_idle_timeout_while_playing() {
        let (mut player, clock) = controller(40.0);
        player.toggle_play().unwrap();

        clock.advance(Duration::milliseconds(2_999));
        player.tick();
        assert!(player.state().controls_visible);

        clock.advance(Duration::milliseconds(1));
        player.tick();
        assert!(!player.state().controls_visible);
    }

    #[test]
    fn test_pointer_activity_resets_idle_timer() {
        let (mut player, clock) = controller(40.0);
        player.toggle_play().unwrap();

        clock.advance(Duration::seconds(2));
        player.pointer_activity();
        clock.advance(Duration::seconds(2));
        player.tick();
        assert!(player.state().controls_visible);

        clock.advance(Duration::seconds(1));
        player.tick();
        assert!(!player.state().controls_visible);

        player.pointer_activity();
        assert!(player.state().controls_visible);
    }

    #[test]
    fn test_controls_stay_visible_while_paused() {
        let (mut player, clock) = controller(40.0);

        clock.advance(Duration::seconds(10));
        player.tick();
        assert!(player.state().controls_visible);

        player.pointer_leave();
        assert!(player.state().controls_visible);
    }

    #[test]
    fn test_pausing_forces_controls_visible() {
        let (mut player, clock) = controller(40.0);
        player.toggle_play().unwrap();
        clock.advance(Duration::seconds(5));
        player.tick();
        assert!(!player.state().controls_visible);

        player.toggle_play().unwrap();
        assert!(player.state().controls_visible);
    }

    #[test]
    fn test_pointer_leave_hides_while_playing() {
        let (mut player, _) = controller(40.0);
        player.toggle_play().unwrap();
        player.pointer_leave();
        assert!(!player.state().controls_visible);
    }

    #[test]
    fn test_end_of_media_stops_and_shows_controls() {
        let (mut player, clock) = controller(10.0);
        player.toggle_play().unwrap();
        clock.advance(Duration::seconds(4));
        player.tick();

        assert!(player.engine_mut().advance(12.0));
        player.on_ended();

        let state = player.state();
        assert!(!state.playing);
        assert!(state.controls_visible);
        assert_eq!(state.position, 10.0);
        assert_eq!(player.progress_percent(), 100.0);
    }

    #[test]
    fn test_time_update_and_label() {
        let (mut player, _) = controller(130.0);
        player.toggle_play().unwrap();
        player.engine_mut().advance(65.0);
        player.on_time_update();

        assert_eq!(player.time_label(), "1:05 / 2:10");
        assert_eq!(player.progress_percent(), 50.0);
    }

    #[test]
    fn test_players_are_independent() {
        let (mut first, _) = controller(40.0);
        let (second, _) = controller(40.0);

        first.toggle_mute();
        first.seek(0.5);

        assert!(first.state().muted);
        assert!(!second.state().muted);
        assert_eq!(second.state().position, 0.0);
    }
}
