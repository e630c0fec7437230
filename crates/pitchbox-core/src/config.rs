//! Configuration (TOML).
//!
//! すべての項目に既定値があるので、空の TOML でも有効な設定になります。
//!
//! ```toml
//! [capture]
//! countdown_steps = 3
//! max_duration_secs = 30
//!
//! [playback]
//! controls_idle_ms = 3000
//!
//! [store]
//! index_key = "pitchhouse_videos"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{ArtifactId, FieldLimits};

/// ConfigError は設定の読み込み・検証エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchboxConfig {
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Countdown length (3, 2, 1).
    pub countdown_steps: u32,
    pub countdown_interval_ms: u64,
    /// Hard cap on a recording; reaching it stops the recording like `stop()`.
    pub max_duration_secs: u64,
    pub recorded_mime_type: String,
    /// Selected files must carry a MIME type with this prefix.
    pub accepted_mime_prefix: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            countdown_steps: 3,
            countdown_interval_ms: 1_000,
            max_duration_secs: 30,
            recorded_mime_type: "video/webm".to_string(),
            accepted_mime_prefix: "video/".to_string(),
        }
    }
}

impl CaptureConfig {
    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Controls hide after this much pointer inactivity while playing.
    pub controls_idle_ms: u64,
    /// Arrow-key seek distance.
    pub seek_step_secs: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            controls_idle_ms: 3_000,
            seek_step_secs: 5.0,
        }
    }
}

impl PlaybackConfig {
    pub fn controls_idle(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.controls_idle_ms.min(i64::MAX as u64) as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Namespace key of the metadata index.
    pub index_key: String,
    pub binary_ref_prefix: String,
    pub title_max_chars: usize,
    pub description_max_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_key: "pitchhouse_videos".to_string(),
            binary_ref_prefix: "pitchhouse_blob_".to_string(),
            title_max_chars: 60,
            description_max_chars: 200,
        }
    }
}

impl StoreConfig {
    pub fn limits(&self) -> FieldLimits {
        FieldLimits {
            title_max_chars: self.title_max_chars,
            description_max_chars: self.description_max_chars,
        }
    }

    pub fn binary_ref_for(&self, id: &ArtifactId) -> String {
        format!("{}{}", self.binary_ref_prefix, id)
    }
}

impl PitchboxConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: PitchboxConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// 起動時検証（Fail-fast）
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capture = &self.capture;
        if capture.countdown_steps == 0 {
            return Err(ConfigError::Invalid(
                "capture.countdown_steps must be at least 1".into(),
            ));
        }
        if capture.countdown_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "capture.countdown_interval_ms must be positive".into(),
            ));
        }
        if capture.max_duration_secs == 0 {
            return Err(ConfigError::Invalid(
                "capture.max_duration_secs must be positive".into(),
            ));
        }
        if capture.accepted_mime_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "capture.accepted_mime_prefix must not be empty".into(),
            ));
        }
        if self.playback.controls_idle_ms == 0 {
            return Err(ConfigError::Invalid(
                "playback.controls_idle_ms must be positive".into(),
            ));
        }
        if !(self.playback.seek_step_secs.is_finite() && self.playback.seek_step_secs > 0.0) {
            return Err(ConfigError::Invalid(
                "playback.seek_step_secs must be a positive number".into(),
            ));
        }
        if self.store.index_key.trim().is_empty() {
            return Err(ConfigError::Invalid("store.index_key must not be empty".into()));
        }
        if self.store.title_max_chars == 0 {
            return Err(ConfigError::Invalid(
                "store.title_max_chars must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = PitchboxConfig::from_toml_str("").unwrap();
        assert_eq!(config, PitchboxConfig::default());
        assert_eq!(config.capture.max_duration(), Duration::from_secs(30));
        assert_eq!(config.playback.controls_idle(), chrono::Duration::seconds(3));
        assert_eq!(config.store.index_key, "pitchhouse_videos");
    }

    #[test]
    fn partial_sections_override_only_given_fields() {
        let config = PitchboxConfig::from_toml_str(
            r#"
            [capture]
            max_duration_secs = 10

            [store]
            index_key = "demo_index"
            "#,
        )
        .unwrap();
        assert_eq!(config.capture.max_duration_secs, 10);
        assert_eq!(config.capture.countdown_steps, 3);
        assert_eq!(config.store.index_key, "demo_index");
        assert_eq!(config.store.binary_ref_prefix, "pitchhouse_blob_");
    }

    #[test]
    fn zero_countdown_is_rejected() {
        let err = PitchboxConfig::from_toml_str("[capture]\ncountdown_steps = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("countdown_steps")));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = PitchboxConfig::from_toml_str("[capture\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn binary_ref_uses_prefix() {
        let store = StoreConfig::default();
        assert_eq!(
            store.binary_ref_for(&ArtifactId::new("42")),
            "pitchhouse_blob_42"
        );
    }
}
