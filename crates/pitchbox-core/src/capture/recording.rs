//! ActiveRecording - 録画中だけ存在するデバイス資源の所有者
//!
//! stream と recorder は必ず `release` を通して解放されます。
//! stop / cancel / reset / エラー / session の Drop のどの経路でも同じ関数です。

use bytes::Bytes;
use tokio::time::Instant;

use crate::ports::{DeviceStream, Recorder};

pub(crate) struct ActiveRecording {
    stream: Box<dyn DeviceStream>,
    recorder: Box<dyn Recorder>,
    fragments: Vec<Bytes>,
    deadline: Instant,
    released: bool,
}

impl ActiveRecording {
    pub(crate) fn new(
        stream: Box<dyn DeviceStream>,
        recorder: Box<dyn Recorder>,
        deadline: Instant,
    ) -> Self {
        Self {
            stream,
            recorder,
            fragments: Vec::new(),
            deadline,
            released: false,
        }
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    pub(crate) fn recorder_mut(&mut self) -> &mut dyn Recorder {
        self.recorder.as_mut()
    }

    pub(crate) fn mime_type(&self) -> &str {
        self.recorder.mime_type()
    }

    /// 空の fragment は捨てる
    pub(crate) fn push(&mut self, fragment: Bytes) {
        if !fragment.is_empty() {
            self.fragments.push(fragment);
        }
    }

    pub(crate) fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub(crate) fn fragments(&self) -> &[Bytes] {
        &self.fragments
    }

    /// 録画を止めて残りの fragment を回収する
    pub(crate) async fn drain(&mut self) {
        let rest = self.recorder.finish().await;
        for fragment in rest {
            self.push(fragment);
        }
    }

    /// recorder を止め、すべての track を止める（何度呼んでもよい）
    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.recorder.abort();
        self.stream.stop_tracks();
        self.released = true;
        tracing::debug!(
            live_tracks = self.stream.live_tracks(),
            "capture devices released"
        );
    }
}

impl Drop for ActiveRecording {
    fn drop(&mut self) {
        self.release();
    }
}
