//! Capture - カメラ録画とファイル選択の状態機械
//!
//! ```text
//! Idle ──begin()──▶ Countdown ──(expiry)──▶ Recording ──stop()/上限時間──▶ Stopped
//!  │  ╰──────────acquire_device()──────────▶    │
//!  │                                            ╰──cancel()──▶ Idle
//!  ╰──select_file()──▶ FileSelected
//! Stopped / FileSelected ──reset()──▶ Idle
//! ```

mod recording;
pub mod session;

pub use self::session::{CaptureCommand, CapturePhase, CaptureSession, SelectedFile};
