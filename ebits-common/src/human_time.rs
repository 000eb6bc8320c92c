//! Human-readable time formatting
//!
//! Provides consistent display of seek offsets, delays and durations in log
//! lines and status output.

/// Format thresholds (seconds)
const SHORT_FORMAT_MAX: f64 = 100.0; // < 100s → X.XXs
const MEDIUM_FORMAT_MAX: f64 = 6000.0; // < 100m → M:SS.Xs
                                       // >= 100m → H:MM:SS

/// Format a duration in seconds, choosing the format from its magnitude.
///
/// - Short format (`X.XXs`): below 100 seconds
/// - Medium format (`M:SS.Xs`): 100 seconds up to 100 minutes
/// - Long format (`H:MM:SS`): 100 minutes and above
///
/// Negative values keep their sign; non-finite values render as `"--"`.
///
/// # Examples
///
/// ```
/// use ebits_common::human_time::format_seconds;
///
/// assert_eq!(format_seconds(5.0), "5.00s");
/// assert_eq!(format_seconds(330.0), "5:30.0s");
/// assert_eq!(format_seconds(7200.0), "2:00:00");
/// ```
pub fn format_seconds(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "--".to_string();
    }

    let is_negative = seconds < 0.0;
    let abs_seconds = seconds.abs();

    let formatted = if abs_seconds < SHORT_FORMAT_MAX {
        format!("{:.2}s", abs_seconds)
    } else if abs_seconds < MEDIUM_FORMAT_MAX {
        let minutes = (abs_seconds / 60.0).floor();
        let secs = abs_seconds - minutes * 60.0;
        format!("{}:{:04.1}s", minutes as u64, secs)
    } else {
        let whole = abs_seconds.floor() as u64;
        let hours = whole / 3600;
        let mins = (whole % 3600) / 60;
        let secs = whole % 60;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    };

    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Format a millisecond count; sub-second values stay in milliseconds.
///
/// ```
/// use ebits_common::human_time::format_millis;
///
/// assert_eq!(format_millis(250), "250ms");
/// assert_eq!(format_millis(2000), "2.00s");
/// ```
pub fn format_millis(millis: u64) -> String {
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format_seconds(millis as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_format() {
        assert_eq!(format_seconds(0.0), "0.00s");
        assert_eq!(format_seconds(0.5), "0.50s");
        assert_eq!(format_seconds(99.0), "99.00s");
    }

    #[test]
    fn test_medium_format() {
        assert_eq!(format_seconds(100.0), "1:40.0s");
        assert_eq!(format_seconds(120.0), "2:00.0s");
        assert_eq!(format_seconds(5999.0), "99:59.0s");
    }

    #[test]
    fn test_long_format() {
        assert_eq!(format_seconds(6000.0), "1:40:00");
        assert_eq!(format_seconds(3661.0 * 2.0), "2:02:02");
    }

    #[test]
    fn test_negative_and_non_finite() {
        assert_eq!(format_seconds(-5.0), "-5.00s");
        assert_eq!(format_seconds(f64::NAN), "--");
        assert_eq!(format_seconds(f64::INFINITY), "--");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "0ms");
        assert_eq!(format_millis(999), "999ms");
        assert_eq!(format_millis(1500), "1.50s");
        assert_eq!(format_millis(7_200_000), "2:00:00");
    }
}
