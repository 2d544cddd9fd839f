//! Change records: the difference between two merged snapshots.
//!
//! Keys match case-insensitively; values compare exactly.

use serde::Serialize;
use sources::{ConfigKey, FlatMap};
use std::collections::BTreeMap;

/// Old and new value of a modified key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueChange {
    pub old: String,
    pub new: String,
}

/// Keys added, modified or removed between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub added: BTreeMap<ConfigKey, String>,
    pub modified: BTreeMap<ConfigKey, ValueChange>,
    pub removed: Vec<ConfigKey>,
}

impl ChangeRecord {
    /// Diffs `before` against `after`.
    pub fn between(before: &FlatMap, after: &FlatMap) -> Self {
        let mut record = Self::default();

        for (key, new) in after {
            match before.get(key) {
                None => {
                    record.added.insert(key.clone(), new.clone());
                }
                Some(old) if old != new => {
                    record.modified.insert(
                        key.clone(),
                        ValueChange {
                            old: old.clone(),
                            new: new.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }

        record.removed = before
            .keys()
            .filter(|key| !after.contains_key(*key))
            .cloned()
            .collect();

        record
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Number of keys touched.
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// True when `key` was added, modified or removed.
    pub fn touches(&self, key: &str) -> bool {
        let key = ConfigKey::from(key);
        self.added.contains_key(&key)
            || self.modified.contains_key(&key)
            || self.removed.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(pairs: &[(&str, &str)]) -> FlatMap {
        pairs
            .iter()
            .map(|(k, v)| (ConfigKey::from(*k), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_modified_value() {
        let before = flat(&[("Server:Port", "5000"), ("Server:Host", "localhost")]);
        let after = flat(&[("Server:Port", "6000"), ("Server:Host", "localhost")]);

        let record = ChangeRecord::between(&before, &after);
        assert!(record.added.is_empty());
        assert!(record.removed.is_empty());
        assert_eq!(record.modified.len(), 1);
        assert_eq!(
            record.modified.get(&ConfigKey::from("Server:Port")).unwrap(),
            &ValueChange {
                old: "5000".to_string(),
                new: "6000".to_string(),
            }
        );
    }

    #[test]
    fn test_added_and_removed() {
        let before = flat(&[("A", "1"), ("B", "2")]);
        let after = flat(&[("B", "2"), ("C", "3")]);

        let record = ChangeRecord::between(&before, &after);
        assert_eq!(record.added.get(&ConfigKey::from("c")).unwrap(), "3");
        assert_eq!(record.removed, vec![ConfigKey::from("A")]);
        assert!(record.modified.is_empty());
        assert_eq!(record.len(), 2);
        assert!(record.touches("a"));
        assert!(!record.touches("B"));
    }

    #[test]
    fn test_identical_snapshots_are_empty() {
        let snapshot = flat(&[("A", "1")]);
        assert!(ChangeRecord::between(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn test_key_case_change_is_not_a_change() {
        let before = flat(&[("Server:Port", "5000")]);
        let after = flat(&[("server:port", "5000")]);
        assert!(ChangeRecord::between(&before, &after).is_empty());
    }

    #[test]
    fn test_value_case_change_is_a_change() {
        let before = flat(&[("Mode", "debug")]);
        let after = flat(&[("Mode", "Debug")]);
        let record = ChangeRecord::between(&before, &after);
        assert_eq!(record.modified.len(), 1);
    }

    #[test]
    fn test_serializes_with_plain_keys() {
        let record = ChangeRecord::between(&flat(&[]), &flat(&[("A:B", "1")]));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["added"]["A:B"], "1");
    }
}
