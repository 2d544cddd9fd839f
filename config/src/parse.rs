//! Lenient scalar parsing for typed getters.
//!
//! Every function returns `None` for input it cannot interpret; callers
//! substitute their default.

use std::str::FromStr;
use std::time::Duration;

const TRUTHY: &[&str] = &["1", "true", "yes", "y", "on"];
const FALSY: &[&str] = &["0", "false", "no", "n", "off"];

/// Parses any `FromStr` type after trimming surrounding whitespace.
pub fn parse_value<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

/// Accepts `1/true/yes/y/on` and `0/false/no/n/off` in any case, then falls
/// back to `bool::from_str`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    let value = raw.trim();
    if TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(value)) {
        return Some(true);
    }
    if FALSY.iter().any(|f| f.eq_ignore_ascii_case(value)) {
        return Some(false);
    }
    value.parse().ok()
}

/// Parses a duration.
///
/// ## Formats
/// - plain seconds, integer or fractional: `30`, `1.5`
/// - suffixed: `250ms`, `10s`, `5m`, `2h`, `1d`
/// - clock: `hh:mm:ss` or `hh:mm:ss.fff`, optionally prefixed by days as
///   `d.hh:mm:ss`
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if value.contains(':') {
        return parse_clock(value);
    }

    let split = value
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.trim().parse().ok()?;

    let seconds = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" => number,
        "ms" => number / 1000.0,
        "m" => number * 60.0,
        "h" => number * 3600.0,
        "d" => number * 86_400.0,
        _ => return None,
    };
    Duration::try_from_secs_f64(seconds).ok()
}

fn parse_clock(value: &str) -> Option<Duration> {
    let parts: Vec<&str> = value.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return None;
    };

    let (days, hours) = match hours.split_once('.') {
        Some((days, hours)) => (days.parse::<u64>().ok()?, hours),
        None => (0, *hours),
    };
    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    let whole = days
        .checked_mul(86_400)?
        .checked_add(hours.checked_mul(3600)?)?
        .checked_add(minutes * 60)?;
    Some(Duration::from_secs(whole) + Duration::try_from_secs_f64(seconds).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_trims() {
        assert_eq!(parse_value::<i32>(" 42 "), Some(42));
        assert_eq!(parse_value::<i32>("notanumber"), None);
        assert_eq!(parse_value::<u16>("70000"), None);
    }

    #[test]
    fn test_parse_bool_tokens() {
        for token in ["1", "TRUE", "Yes", "y", "On"] {
            assert_eq!(parse_bool(token), Some(true), "{}", token);
        }
        for token in ["0", "False", "NO", "n", "off"] {
            assert_eq!(parse_bool(token), Some(false), "{}", token);
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_parse_duration_seconds() {
        assert_eq!(parse_duration("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("1.5"), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_parse_duration_suffixes() {
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("10s"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("2H"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("5 weeks"), None);
    }

    #[test]
    fn test_parse_duration_clock() {
        assert_eq!(parse_duration("00:01:30"), Some(Duration::from_secs(90)));
        assert_eq!(
            parse_duration("1.02:00:00"),
            Some(Duration::from_secs(86_400 + 7200))
        );
        assert_eq!(parse_duration("00:61:00"), None);
        assert_eq!(parse_duration("01:00"), None);
    }

    #[test]
    fn test_parse_duration_rejects_negative() {
        assert_eq!(parse_duration("-5"), None);
        assert_eq!(parse_duration("abc"), None);
    }
}
