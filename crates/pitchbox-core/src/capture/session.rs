//! CaptureSession - 1 回分の録画 / ファイル選択
//!
//! # 設計原則
//! - 状態は `SessionState` の 1 つの enum で表す（録画中かつファイル選択済み、
//!   のような不正な組み合わせは表現できない）
//! - デバイス資源は `ActiveRecording` だけが持ち、Recording を抜けると必ず解放される
//! - await の途中で放棄されても資源が半端に残らないよう、
//!   await の前に状態を確定させる
//!
//! # 使用例
//! ```ignore
//! let mut session = CaptureSession::new(devices, urls, CaptureConfig::default());
//! session.begin()?;
//! let (tx, mut rx) = tokio::sync::mpsc::channel(4);
//! // UI から tx.send(CaptureCommand::Stop)
//! session.drive(&mut rx).await?;
//! let payload = session.payload();
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::CaptureConfig;
use crate::domain::{BinaryPayload, CaptureError, is_accepted_media_type};
use crate::ports::{MediaDevices, StreamRequest};
use crate::store::{DisplayRef, ObjectUrlRegistry};

use super::recording::ActiveRecording;

/// 外から見える状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    /// 表示中のカウント（3, 2, 1）
    Countdown { remaining: u32 },
    Recording,
    Stopped,
    FileSelected,
}

impl CapturePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Countdown { .. } => "counting down",
            CapturePhase::Recording => "recording",
            CapturePhase::Stopped => "stopped",
            CapturePhase::FileSelected => "holding a selected file",
        }
    }

    /// `drive` が待ち続ける状態か
    pub fn is_live(&self) -> bool {
        matches!(self, CapturePhase::Countdown { .. } | CapturePhase::Recording)
    }
}

/// UI から `drive` に送る操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Stop,
    Cancel,
}

/// ユーザーが選んだ既存ファイル
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// 完成した payload と、そのプレビュー用参照
struct CapturedMedia {
    payload: BinaryPayload,
    preview: DisplayRef,
}

#[derive(Default)]
enum SessionState {
    #[default]
    Idle,
    Countdown {
        remaining: u32,
        next_tick: Instant,
    },
    Recording(ActiveRecording),
    Stopped(CapturedMedia),
    FileSelected(CapturedMedia),
}

impl SessionState {
    fn phase(&self) -> CapturePhase {
        match self {
            SessionState::Idle => CapturePhase::Idle,
            SessionState::Countdown { remaining, .. } => CapturePhase::Countdown {
                remaining: *remaining,
            },
            SessionState::Recording(_) => CapturePhase::Recording,
            SessionState::Stopped(_) => CapturePhase::Stopped,
            SessionState::FileSelected(_) => CapturePhase::FileSelected,
        }
    }

    fn media(&self) -> Option<&CapturedMedia> {
        match self {
            SessionState::Stopped(media) | SessionState::FileSelected(media) => Some(media),
            _ => None,
        }
    }
}

/// 待機の結果。待つだけで状態は変えない
enum SessionEvent {
    CountdownTick,
    Fragment(Bytes),
    InputEnded,
    DeadlineReached,
    Settled,
}

enum DriveStep {
    Command(Option<CaptureCommand>),
    Event(SessionEvent),
}

pub struct CaptureSession {
    devices: Arc<dyn MediaDevices>,
    urls: ObjectUrlRegistry,
    config: CaptureConfig,
    state: SessionState,
}

impl CaptureSession {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        urls: ObjectUrlRegistry,
        config: CaptureConfig,
    ) -> Self {
        Self {
            devices,
            urls,
            config,
            state: SessionState::Idle,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.state.phase()
    }

    /// Stopped / FileSelected のときの payload
    pub fn payload(&self) -> Option<&BinaryPayload> {
        self.state.media().map(|media| &media.payload)
    }

    /// payload のプレビュー用参照（reset で取り消される）
    pub fn preview(&self) -> Option<&DisplayRef> {
        self.state.media().map(|media| &media.preview)
    }

    /// 録画中に集まった fragment 数
    pub fn fragment_count(&self) -> usize {
        match &self.state {
            SessionState::Recording(active) => active.fragment_count(),
            _ => 0,
        }
    }

    fn invalid(&self, action: &'static str) -> CaptureError {
        CaptureError::InvalidTransition {
            action,
            phase: self.phase().as_str(),
        }
    }

    /// Idle → Countdown
    pub fn begin(&mut self) -> Result<(), CaptureError> {
        if !matches!(self.state, SessionState::Idle) {
            return Err(self.invalid("begin a countdown"));
        }
        self.state = SessionState::Countdown {
            remaining: self.config.countdown_steps,
            next_tick: Instant::now() + self.config.countdown_interval(),
        };
        tracing::debug!(steps = self.config.countdown_steps, "countdown started");
        Ok(())
    }

    /// 次の出来事まで待って 1 段階進める
    ///
    /// - Countdown: 次の tick まで待ち、0 になったらデバイスを確保して Recording へ
    /// - Recording: fragment の到着・入力の終了・上限時間のどれかを待つ
    /// - それ以外: 待たずに現在の状態を返す
    pub async fn advance(&mut self) -> Result<CapturePhase, CaptureError> {
        let event = self.next_event().await;
        self.apply(event).await?;
        Ok(self.phase())
    }

    /// 次の出来事を待つ。cancel-safe（途中で放棄しても状態は変わらない）
    async fn next_event(&mut self) -> SessionEvent {
        match &mut self.state {
            SessionState::Countdown { next_tick, .. } => {
                tokio::time::sleep_until(*next_tick).await;
                SessionEvent::CountdownTick
            }
            SessionState::Recording(active) => {
                let deadline = active.deadline();
                tokio::select! {
                    fragment = active.recorder_mut().next_fragment() => match fragment {
                        Some(fragment) => SessionEvent::Fragment(fragment),
                        None => SessionEvent::InputEnded,
                    },
                    _ = tokio::time::sleep_until(deadline) => SessionEvent::DeadlineReached,
                }
            }
            _ => SessionEvent::Settled,
        }
    }

    /// 出来事を状態に反映する。stop / デバイス確保はここで最後まで行う
    async fn apply(&mut self, event: SessionEvent) -> Result<(), CaptureError> {
        match event {
            SessionEvent::CountdownTick => {
                let interval = self.config.countdown_interval();
                let expired = match &mut self.state {
                    SessionState::Countdown {
                        remaining,
                        next_tick,
                    } => {
                        *remaining = remaining.saturating_sub(1);
                        *next_tick += interval;
                        *remaining == 0
                    }
                    _ => false,
                };
                if expired {
                    self.acquire_device().await?;
                }
            }
            SessionEvent::Fragment(fragment) => {
                if let SessionState::Recording(active) = &mut self.state {
                    active.push(fragment);
                }
            }
            SessionEvent::InputEnded => {
                tracing::info!("capture input ended; stopping");
                self.stop().await?;
            }
            SessionEvent::DeadlineReached => {
                tracing::info!(
                    max_secs = self.config.max_duration_secs,
                    "maximum recording duration reached; stopping"
                );
                self.stop().await?;
            }
            SessionEvent::Settled => {}
        }
        Ok(())
    }

    /// Idle / Countdown → Recording
    ///
    /// 失敗したら Idle に戻り、確保しかけた track はすべて止まっている。
    #[tracing::instrument(skip(self))]
    pub async fn acquire_device(&mut self) -> Result<(), CaptureError> {
        if !matches!(
            self.state,
            SessionState::Idle | SessionState::Countdown { .. }
        ) {
            return Err(self.invalid("acquire a device"));
        }
        // 放棄されたときに Countdown のまま残らないよう先に Idle にする
        self.state = SessionState::Idle;

        let mut stream = self
            .devices
            .open_stream(StreamRequest::camera_and_microphone())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "device acquisition failed");
                CaptureError::from(e)
            })?;

        let recorder = match stream.start_recorder(&self.config.recorded_mime_type) {
            Ok(recorder) => recorder,
            Err(e) => {
                stream.stop_tracks();
                tracing::warn!(error = %e, "recorder failed to start; device released");
                return Err(e.into());
            }
        };

        let deadline = Instant::now() + self.config.max_duration();
        self.state = SessionState::Recording(ActiveRecording::new(stream, recorder, deadline));
        tracing::info!(max_secs = self.config.max_duration_secs, "recording started");
        Ok(())
    }

    /// Recording → Stopped。fragment を捕捉順に連結する
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        if !matches!(self.state, SessionState::Recording(_)) {
            return Err(self.invalid("stop"));
        }
        // drain が終わるまで Recording のまま。放棄されても fragment は失われない
        if let SessionState::Recording(active) = &mut self.state {
            active.drain().await;
        }

        let mut active = match std::mem::take(&mut self.state) {
            SessionState::Recording(active) => active,
            other => {
                self.state = other;
                return Err(self.invalid("stop"));
            }
        };
        active.release();
        let payload = BinaryPayload::concat(active.fragments(), active.mime_type().to_string());
        drop(active);

        tracing::info!(size = payload.len(), "recording stopped");
        let preview = self.urls.create(payload.clone());
        self.state = SessionState::Stopped(CapturedMedia { payload, preview });
        Ok(())
    }

    /// Countdown / Recording → Idle。fragment は捨て、デバイスは必ず解放する
    pub fn cancel(&mut self) {
        match std::mem::take(&mut self.state) {
            SessionState::Countdown { .. } => {
                tracing::debug!("countdown cancelled");
            }
            SessionState::Recording(active) => {
                tracing::info!(
                    discarded = active.fragment_count(),
                    "recording cancelled"
                );
                drop(active);
            }
            other => self.state = other,
        }
    }

    /// 既存ファイルを選ぶ（Idle → FileSelected）
    ///
    /// 何も選ばれなかった（`None` や 0 byte）場合は何もしない。
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Result<(), CaptureError> {
        let Some(file) = file else {
            return Ok(());
        };
        if file.bytes.is_empty() {
            tracing::debug!(name = %file.name, "empty file selection ignored");
            return Ok(());
        }
        if !matches!(self.state, SessionState::Idle) {
            return Err(self.invalid("select a file"));
        }
        if !is_accepted_media_type(&file.mime_type, &self.config.accepted_mime_prefix) {
            tracing::warn!(name = %file.name, mime_type = %file.mime_type, "rejected file selection");
            return Err(CaptureError::InvalidMediaFormat {
                mime_type: file.mime_type,
            });
        }

        let payload = BinaryPayload::new(file.bytes, file.mime_type);
        let preview = self.urls.create(payload.clone());
        tracing::info!(name = %file.name, size = payload.len(), "file selected");
        self.state = SessionState::FileSelected(CapturedMedia { payload, preview });
        Ok(())
    }

    /// どの状態からでも Idle に戻す。プレビュー参照を取り消し、デバイスを解放する
    pub fn reset(&mut self) {
        match std::mem::take(&mut self.state) {
            SessionState::Stopped(media) | SessionState::FileSelected(media) => {
                media.preview.release();
            }
            SessionState::Recording(active) => drop(active),
            SessionState::Idle | SessionState::Countdown { .. } => {}
        }
    }

    /// Countdown / Recording の間、コマンドと時間経過に応じて進め続ける
    ///
    /// `commands` の送り手がいなくなったら（UI が閉じられたら）cancel する。
    pub async fn drive(
        &mut self,
        commands: &mut mpsc::Receiver<CaptureCommand>,
    ) -> Result<CapturePhase, CaptureError> {
        while self.phase().is_live() {
            // select! で待つのは cancel-safe な待機だけ。状態の変更は select! の外で行う
            let step = tokio::select! {
                biased;
                command = commands.recv() => DriveStep::Command(command),
                event = self.next_event() => DriveStep::Event(event),
            };
            match step {
                DriveStep::Command(Some(CaptureCommand::Stop)) => {
                    if matches!(self.state, SessionState::Recording(_)) {
                        self.stop().await?;
                    } else {
                        self.cancel();
                    }
                }
                DriveStep::Command(Some(CaptureCommand::Cancel)) | DriveStep::Command(None) => {
                    self.cancel();
                }
                DriveStep::Event(event) => self.apply(event).await?,
            }
        }
        Ok(self.phase())
    }
}
