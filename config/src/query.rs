//! # Query Façade
//!
//! Typed, lenient lookups shared by [`crate::Configuration`] and
//! [`crate::Section`]. Implementors supply raw lookup; every typed getter
//! returns the caller's default when the key is absent or its value does not
//! parse. No getter ever returns an error.

use crate::parse;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

pub trait ConfigReader {
    /// Raw value for `key`, matched case-insensitively.
    fn get(&self, key: &str) -> Option<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Generic lenient getter backing the typed getters below.
    fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).as_deref().and_then(parse::parse_value)
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get_parsed(key).unwrap_or(default)
    }

    fn get_long(&self, key: &str, default: i64) -> i64 {
        self.get_parsed(key).unwrap_or(default)
    }

    fn get_float(&self, key: &str, default: f64) -> f64 {
        self.get_parsed(key).unwrap_or(default)
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .as_deref()
            .and_then(parse::parse_bool)
            .unwrap_or(default)
    }

    fn get_duration(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .as_deref()
            .and_then(parse::parse_duration)
            .unwrap_or(default)
    }

    fn get_uuid(&self, key: &str, default: Uuid) -> Uuid {
        self.get_parsed(key).unwrap_or(default)
    }
}
