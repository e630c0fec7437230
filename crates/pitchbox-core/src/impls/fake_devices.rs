//! FakeMediaDevices - 台本どおりに動くカメラ/マイク（開発・テスト用）
//!
//! # 学習ポイント
//! - `Arc` で共有した状態を、テスト側のハンドルとストリーム側の両方から触る
//! - `tokio::sync::mpsc` の unbounded channel で fragment を録画器に流す
//!   （`recv` は cancel-safe なので `select!` の分岐に使える）
//! - Drop で track を止め、解放漏れを `live_tracks()` で観測できる

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::ports::{DeviceError, DeviceStream, MediaDevices, Recorder, StreamRequest};

/// デバイス要求に対する応答
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    Granted,
    Denied,
    Unavailable,
}

#[derive(Default)]
struct FakeDeviceState {
    mode: Mutex<AccessMode>,
    live_tracks: AtomicUsize,
    streams_opened: AtomicUsize,
    fail_recorder_start: AtomicBool,
    feed: Mutex<Option<mpsc::UnboundedSender<Bytes>>>,
}

impl FakeDeviceState {
    fn feed(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<Bytes>>> {
        self.feed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// FakeMediaDevices はクローン間で状態を共有する
///
/// # 使用例
/// ```ignore
/// let devices = FakeMediaDevices::new();
/// let mut session = CaptureSession::new(Arc::new(devices.clone()), urls, config);
/// session.acquire_device().await?;
/// devices.emit("chunk-1");
/// ```
#[derive(Clone, Default)]
pub struct FakeMediaDevices {
    state: Arc<FakeDeviceState>,
}

impl FakeMediaDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: AccessMode) -> Self {
        let devices = Self::new();
        devices.set_mode(mode);
        devices
    }

    pub fn set_mode(&self, mode: AccessMode) {
        *self.state.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
    }

    /// 次の `start_recorder` を失敗させる（ストリーム確保後の失敗を再現）
    pub fn fail_recorder_start(&self, fail: bool) {
        self.state.fail_recorder_start.store(fail, Ordering::SeqCst);
    }

    /// 動作中の録画器に fragment を渡す。録画器がいなければ `false`
    pub fn emit(&self, fragment: impl Into<Bytes>) -> bool {
        match self.state.feed().as_ref() {
            Some(feed) => feed.send(fragment.into()).is_ok(),
            None => false,
        }
    }

    /// 入力の終了（カメラが外れたなど）。録画器の `next_fragment` は `None` を返す
    pub fn end_input(&self) {
        self.state.feed().take();
    }

    /// 止められていない track の合計
    pub fn live_tracks(&self) -> usize {
        self.state.live_tracks.load(Ordering::SeqCst)
    }

    pub fn streams_opened(&self) -> usize {
        self.state.streams_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn open_stream(
        &self,
        request: StreamRequest,
    ) -> Result<Box<dyn DeviceStream>, DeviceError> {
        let mode = *self.state.mode.lock().unwrap_or_else(|e| e.into_inner());
        match mode {
            AccessMode::Denied => Err(DeviceError::PermissionDenied(
                "user dismissed the permission prompt".into(),
            )),
            AccessMode::Unavailable => Err(DeviceError::Unavailable("no camera found".into())),
            AccessMode::Granted => {
                let tracks = usize::from(request.video) + usize::from(request.audio);
                self.state.live_tracks.fetch_add(tracks, Ordering::SeqCst);
                self.state.streams_opened.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(FakeStream {
                    live: tracks,
                    state: Arc::clone(&self.state),
                }))
            }
        }
    }
}

struct FakeStream {
    live: usize,
    state: Arc<FakeDeviceState>,
}

impl DeviceStream for FakeStream {
    fn live_tracks(&self) -> usize {
        self.live
    }

    fn stop_tracks(&mut self) {
        if self.live > 0 {
            self.state.live_tracks.fetch_sub(self.live, Ordering::SeqCst);
            self.live = 0;
        }
    }

    fn start_recorder(&mut self, mime_type: &str) -> Result<Box<dyn Recorder>, DeviceError> {
        if self.state.fail_recorder_start.load(Ordering::SeqCst) {
            return Err(DeviceError::Unavailable("recorder refused to start".into()));
        }
        if self.live == 0 {
            return Err(DeviceError::Unavailable("stream already stopped".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.state.feed() = Some(tx);
        Ok(Box::new(FakeRecorder {
            mime_type: mime_type.to_string(),
            rx,
            stopped: false,
        }))
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

struct FakeRecorder {
    mime_type: String,
    rx: mpsc::UnboundedReceiver<Bytes>,
    stopped: bool,
}

#[async_trait]
impl Recorder for FakeRecorder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn next_fragment(&mut self) -> Option<Bytes> {
        if self.stopped {
            return None;
        }
        self.rx.recv().await
    }

    async fn finish(&mut self) -> Vec<Bytes> {
        self.stopped = true;
        self.rx.close();
        let mut rest = Vec::new();
        while let Ok(fragment) = self.rx.try_recv() {
            rest.push(fragment);
        }
        rest
    }

    fn abort(&mut self) {
        self.stopped = true;
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracks_are_counted_and_released_on_drop() {
        let devices = FakeMediaDevices::new();
        let stream = devices
            .open_stream(StreamRequest::camera_and_microphone())
            .await
            .unwrap();
        assert_eq!(devices.live_tracks(), 2);
        assert_eq!(stream.live_tracks(), 2);

        drop(stream);
        assert_eq!(devices.live_tracks(), 0);
    }

    #[tokio::test]
    async fn test_denied_access_opens_nothing() {
        let devices = FakeMediaDevices::with_mode(AccessMode::Denied);
        let err = devices
            .open_stream(StreamRequest::camera_and_microphone())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DeviceError::PermissionDenied(_)));
        assert_eq!(devices.live_tracks(), 0);
        assert_eq!(devices.streams_opened(), 0);
    }

    #[tokio::test]
    async fn test_recorder_yields_fragments_in_order() {
        let devices = FakeMediaDevices::new();
        let mut stream = devices
            .open_stream(StreamRequest::camera_and_microphone())
            .await
            .unwrap();
        let mut recorder = stream.start_recorder("video/webm").unwrap();

        assert!(devices.emit("A"));
        assert!(devices.emit("B"));
        assert!(devices.emit("C"));

        assert_eq!(recorder.next_fragment().await, Some(Bytes::from("A")));
        let rest = recorder.finish().await;
        assert_eq!(rest, vec![Bytes::from("B"), Bytes::from("C")]);
        assert!(!devices.emit("D"));
    }
}
