//! Playback - 1 つの player の操作状態

pub mod controller;
pub mod keys;
pub mod time;

pub use self::controller::{PlaybackController, PlaybackState};
pub use self::keys::KeyCommand;
pub use self::time::format_time;
