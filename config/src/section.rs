//! Prefix-scoped view over a [`Configuration`].

use crate::binder;
use crate::configuration::Configuration;
use crate::query::ConfigReader;
use errors::{BindError, ConfigError};
use serde::de::DeserializeOwned;
use sources::{ConfigKey, FlatMap, KEY_DELIMITER, combine};
use std::collections::BTreeSet;
use validator::Validate;

/// Keys passed to a section are resolved relative to its prefix, so
/// `config.section("Database").get("Host")` reads `Database:Host`.
///
/// A section borrows the configuration and always reads its current
/// snapshot.
#[derive(Clone, Copy)]
pub struct Section<'a> {
    config: &'a Configuration,
    prefix: &'a str,
}

/// Owned-prefix variant returned by [`Section::section`].
pub struct OwnedSection<'a> {
    config: &'a Configuration,
    prefix: String,
}

impl<'a> Section<'a> {
    pub(crate) fn new(config: &'a Configuration, prefix: &'a str) -> Self {
        Self { config, prefix }
    }

    pub fn prefix(&self) -> &str {
        self.prefix
    }

    pub fn exists(&self) -> bool {
        section_exists(self.config, self.prefix)
    }

    pub fn children(&self) -> Vec<String> {
        section_children(self.config, self.prefix)
    }

    pub fn snapshot(&self) -> FlatMap {
        section_snapshot(self.config, self.prefix)
    }

    pub fn section(&self, name: &str) -> OwnedSection<'a> {
        OwnedSection {
            config: self.config,
            prefix: combine(self.prefix, name),
        }
    }

    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        binder::bind_snapshot(&self.config.snapshot_arc(), self.prefix)
    }

    pub fn bind_validated<T: DeserializeOwned + Validate>(&self) -> Result<T, ConfigError> {
        validated(self.bind()?)
    }
}

impl<'a> OwnedSection<'a> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn as_section(&self) -> Section<'_> {
        Section {
            config: self.config,
            prefix: &self.prefix,
        }
    }

    pub fn exists(&self) -> bool {
        self.as_section().exists()
    }

    pub fn children(&self) -> Vec<String> {
        self.as_section().children()
    }

    pub fn snapshot(&self) -> FlatMap {
        self.as_section().snapshot()
    }

    pub fn section(&self, name: &str) -> OwnedSection<'a> {
        OwnedSection {
            config: self.config,
            prefix: combine(&self.prefix, name),
        }
    }

    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        self.as_section().bind()
    }

    pub fn bind_validated<T: DeserializeOwned + Validate>(&self) -> Result<T, ConfigError> {
        self.as_section().bind_validated()
    }
}

impl ConfigReader for Section<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.config.get(&combine(self.prefix, key))
    }
}

impl ConfigReader for OwnedSection<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.config.get(&combine(&self.prefix, key))
    }
}

pub(crate) fn validated<T: Validate>(value: T) -> Result<T, ConfigError> {
    value.validate().map_err(|e| {
        ConfigError::Bind(BindError::Validation {
            reason: e.to_string(),
        })
    })?;
    Ok(value)
}

fn section_exists(config: &Configuration, prefix: &str) -> bool {
    let snapshot = config.snapshot_arc();
    let key = ConfigKey::from(prefix);
    snapshot.contains_key(&key) || snapshot.keys().any(|k| k.strip_section(prefix).is_some())
}

fn section_children(config: &Configuration, prefix: &str) -> Vec<String> {
    let snapshot = config.snapshot_arc();
    let children: BTreeSet<ConfigKey> = snapshot
        .keys()
        .filter_map(|key| key.strip_section(prefix))
        .filter_map(|rest| rest.split(KEY_DELIMITER).next())
        .map(ConfigKey::from)
        .collect();
    children.into_iter().map(ConfigKey::into_string).collect()
}

fn section_snapshot(config: &Configuration, prefix: &str) -> FlatMap {
    config
        .snapshot_arc()
        .iter()
        .filter_map(|(key, value)| {
            key.strip_section(prefix)
                .map(|rest| (ConfigKey::from(rest), value.clone()))
        })
        .collect()
}
