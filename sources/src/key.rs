//! # Configuration Keys
//!
//! Case-insensitive dotted-path keys and the flat mapping every source
//! produces.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Separator between path segments of a flattened key.
pub const KEY_DELIMITER: char = ':';

/// Flat mapping from case-insensitive key to string value, ordered
/// case-insensitively.
pub type FlatMap = BTreeMap<ConfigKey, String>;

/// A dotted-path configuration key.
///
/// Equality, ordering and hashing ignore case, so `Server:Port` and
/// `server:PORT` name the same entry. The casing supplied at construction is
/// preserved for display.
#[derive(Clone, Default)]
pub struct ConfigKey(String);

impl ConfigKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Path segments split on [`KEY_DELIMITER`].
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(KEY_DELIMITER)
    }

    /// Returns the remainder of this key below `prefix`, if the key lives
    /// under it. An empty prefix matches every key.
    pub fn strip_section(&self, prefix: &str) -> Option<&str> {
        if prefix.is_empty() {
            return Some(&self.0);
        }
        let head = self.0.get(..prefix.len())?;
        if !eq_ignore_case(head, prefix) {
            return None;
        }
        self.0[prefix.len()..].strip_prefix(KEY_DELIMITER)
    }

    fn folded(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().flat_map(char::to_lowercase)
    }
}

/// Joins path segments with [`KEY_DELIMITER`], skipping empty segments.
pub fn combine(prefix: &str, key: &str) -> String {
    match (prefix.is_empty(), key.is_empty()) {
        (true, _) => key.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}{KEY_DELIMITER}{key}"),
    }
}

/// Case-insensitive string comparison used for keys and hints.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

impl PartialEq for ConfigKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ConfigKey {}

impl PartialOrd for ConfigKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConfigKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl Hash for ConfigKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.folded() {
            c.hash(state);
        }
    }
}

impl fmt::Debug for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ConfigKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Serialize for ConfigKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
