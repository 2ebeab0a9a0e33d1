//! Compact duration strings ("30m", "2h", "1h30m")
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Overflow-checked accumulation, std Duration helper for config values
//! - 1.0.0: Extracted from the remind command handler

use std::time::Duration;

/// Parse a compact duration string like "30m", "2h", "1d", "1h30m" into seconds
///
/// Units: `s`, `m`, `h`, `d`, `w`. Returns `None` for anything that does not
/// add up to a positive number of seconds, including trailing digits without
/// a unit.
pub fn parse_duration(time_str: &str) -> Option<i64> {
    let time_str = time_str.trim().to_lowercase();
    let mut total_seconds: i64 = 0;
    let mut current_number = String::new();

    for c in time_str.chars() {
        if c.is_ascii_digit() {
            current_number.push(c);
            continue;
        }
        if current_number.is_empty() {
            return None;
        }

        let value: i64 = current_number.parse().ok()?;
        current_number.clear();

        let seconds = match c {
            's' => Some(value),
            'm' => value.checked_mul(60),
            'h' => value.checked_mul(60 * 60),
            'd' => value.checked_mul(60 * 60 * 24),
            'w' => value.checked_mul(60 * 60 * 24 * 7),
            _ => None,
        }?;
        total_seconds = total_seconds.checked_add(seconds)?;
    }

    if !current_number.is_empty() {
        return None;
    }

    if total_seconds > 0 {
        Some(total_seconds)
    } else {
        None
    }
}

/// Same as [`parse_duration`] but yields a `std::time::Duration`
pub fn parse_std_duration(time_str: &str) -> Option<Duration> {
    parse_duration(time_str).map(|secs| Duration::from_secs(secs as u64))
}

/// Format a duration in seconds into a human-readable string
pub fn format_duration(seconds: i64) -> String {
    fn plural(n: i64, unit: &str) -> String {
        format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
    }

    if seconds < 60 {
        plural(seconds, "second")
    } else if seconds < 3600 {
        plural(seconds / 60, "minute")
    } else if seconds < 86400 {
        let hours = seconds / 3600;
        let mins = (seconds % 3600) / 60;
        if mins > 0 {
            format!("{} {}", plural(hours, "hour"), plural(mins, "minute"))
        } else {
            plural(hours, "hour")
        }
    } else {
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        if hours > 0 {
            format!("{} {}", plural(days, "day"), plural(hours, "hour"))
        } else {
            plural(days, "day")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s"), Some(30));
        assert_eq!(parse_duration("30m"), Some(1800));
        assert_eq!(parse_duration("2h"), Some(7200));
        assert_eq!(parse_duration("1d"), Some(86400));
        assert_eq!(parse_duration("1w"), Some(604800));
        assert_eq!(parse_duration("1h30m"), Some(5400));
        assert_eq!(parse_duration(" 2H "), Some(7200));
        assert_eq!(parse_duration("invalid"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("0m"), None);
    }

    #[test]
    fn test_parse_duration_rejects_dangling_number() {
        assert_eq!(parse_duration("1h30"), None);
        assert_eq!(parse_duration("90"), None);
        assert_eq!(parse_duration("h"), None);
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert_eq!(parse_duration("99999999999999999999w"), None);
        assert_eq!(parse_duration("9223372036854775807w"), None);
    }

    #[test]
    fn test_parse_std_duration() {
        assert_eq!(parse_std_duration("60s"), Some(Duration::from_secs(60)));
        assert_eq!(parse_std_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_std_duration("nope"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30 seconds");
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(60), "1 minute");
        assert_eq!(format_duration(120), "2 minutes");
        assert_eq!(format_duration(3600), "1 hour");
        assert_eq!(format_duration(3660), "1 hour 1 minute");
        assert_eq!(format_duration(86400), "1 day");
        assert_eq!(format_duration(90000), "1 day 1 hour");
    }
}
