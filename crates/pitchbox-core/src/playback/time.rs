//! 再生時間の表示形式 `M:SS`

/// 秒数を `M:SS` にする（分はゼロ埋めせず、60 で折り返さない）
///
/// 負の値や NaN は `0:00` として扱います。
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, "0:00")]
    #[case(5.0, "0:05")]
    #[case(59.9, "0:59")]
    #[case(65.0, "1:05")]
    #[case(600.0, "10:00")]
    #[case(3725.0, "62:05")]
    #[case(-3.0, "0:00")]
    #[case(f64::NAN, "0:00")]
    fn test_format_time(#[case] seconds: f64, #[case] expected: &str) {
        assert_eq!(format_time(seconds), expected);
    }
}
