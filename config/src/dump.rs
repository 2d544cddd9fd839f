//! Human-readable dump of a merged snapshot with secret masking.

use sources::FlatMap;
use std::fmt::Write;

const VISIBLE_TAIL: usize = 4;

/// True when `key` contains any hint, ignoring case.
pub fn is_secret_key(key: &str, hints: &[String]) -> bool {
    let key = key.to_lowercase();
    hints
        .iter()
        .filter(|hint| !hint.is_empty())
        .any(|hint| key.contains(&hint.to_lowercase()))
}

/// Replaces all but the last four characters with `*`; values of four
/// characters or fewer are masked entirely.
pub fn mask_value(value: &str) -> String {
    let len = value.chars().count();
    if len <= VISIBLE_TAIL {
        return "*".repeat(len);
    }
    let mut masked = "*".repeat(len - VISIBLE_TAIL);
    masked.extend(value.chars().skip(len - VISIBLE_TAIL));
    masked
}

/// Renders `key = value` lines in case-insensitive key order.
pub fn render(snapshot: &FlatMap, mask: bool, hints: &[String]) -> String {
    let mut out = String::new();
    for (key, value) in snapshot {
        let shown = if mask && is_secret_key(key.as_str(), hints) {
            mask_value(value)
        } else {
            value.clone()
        };
        let _ = writeln!(out, "{} = {}", key, shown);
    }
    out
}
