//! キーボードショートカット

/// player が反応するキー操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    TogglePlay,
    ToggleMute,
    ToggleFullscreen,
    SeekForward,
    SeekBackward,
}

impl KeyCommand {
    /// host のキー名（`" "`, `"k"`, `"ArrowRight"` など）から変換。大文字小文字は区別しない
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            " " | "k" => Some(KeyCommand::TogglePlay),
            "m" => Some(KeyCommand::ToggleMute),
            "f" => Some(KeyCommand::ToggleFullscreen),
            "arrowright" => Some(KeyCommand::SeekForward),
            "arrowleft" => Some(KeyCommand::SeekBackward),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(" ", Some(KeyCommand::TogglePlay))]
    #[case("k", Some(KeyCommand::TogglePlay))]
    #[case("K", Some(KeyCommand::TogglePlay))]
    #[case("m", Some(KeyCommand::ToggleMute))]
    #[case("F", Some(KeyCommand::ToggleFullscreen))]
    #[case("ArrowRight", Some(KeyCommand::SeekForward))]
    #[case("ArrowLeft", Some(KeyCommand::SeekBackward))]
    #[case("ArrowUp", None)]
    #[case("Enter", None)]
    fn test_from_key(#[case] key: &str, #[case] expected: Option<KeyCommand>) {
        assert_eq!(KeyCommand::from_key(key), expected);
    }
}
