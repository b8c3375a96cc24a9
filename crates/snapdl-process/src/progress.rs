//! Progress extraction from free-form tool output.

use regex::Regex;
use std::sync::LazyLock;

/// A 1-3 digit number with an optional fraction, directly followed by `%`.
/// The number must not continue a longer run of digits or a decimal.
static PERCENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9.])(?P<pct>[0-9]{1,3}(?:\.[0-9]+)?)%").expect("valid percent pattern")
});

/// Returns the first percentage found in `line`, or `None`.
///
/// The value is returned as written; callers clamp it into `[0, 100]`.
///
/// ```
/// use snapdl_process::parse_progress;
///
/// assert_eq!(parse_progress("[download]  45.2% of 10MiB"), Some(45.2));
/// assert_eq!(parse_progress("ETA 00:01"), None);
/// ```
#[must_use]
pub fn parse_progress(line: &str) -> Option<f64> {
    PERCENT_PATTERN
        .captures(line)
        .and_then(|caps| caps.name("pct"))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_download_line() {
        let pct = parse_progress("[download]  45.2% of 10MiB at 1.2MiB/s ETA 00:07").unwrap();
        assert_relative_eq!(pct, 45.2);
    }

    #[test]
    fn test_parse_bare_values() {
        assert_relative_eq!(parse_progress("10%").unwrap(), 10.0);
        assert_relative_eq!(parse_progress("55.0%").unwrap(), 55.0);
        assert_relative_eq!(parse_progress("100% done").unwrap(), 100.0);
    }

    #[test]
    fn test_out_of_range_values_are_returned_unclamped() {
        assert_relative_eq!(parse_progress("150%").unwrap(), 150.0);
    }

    #[test]
    fn test_lines_without_percentage() {
        assert_eq!(parse_progress("ETA 00:01"), None);
        assert_eq!(parse_progress("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_progress(""), None);
        assert_eq!(parse_progress("%"), None);
    }

    #[test]
    fn test_rejects_wrong_digit_shape() {
        assert_eq!(parse_progress("1234%"), None);
        assert_eq!(parse_progress("v1.2.3%"), None);
        assert_eq!(parse_progress("50 %"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let pct = parse_progress("[download]  12.5% of ~ 80.00MiB (frag 3/40) 7.5%").unwrap();
        assert_relative_eq!(pct, 12.5);
    }
}
