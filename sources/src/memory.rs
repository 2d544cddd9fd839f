//! In-memory configuration source.

use crate::key::{ConfigKey, FlatMap};
use crate::source::{ConfigSource, SourceKind};
use errors::SourceError;

/// Synthetic location of an in-memory layer.
pub const MEMORY_LOCATION: &str = "<Memory>";

/// A fixed set of entries supplied by the caller, typically defaults or test
/// fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: FlatMap,
}

impl MemorySource {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (ConfigKey::new(k), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for MemorySource {
    fn load(&self) -> Result<FlatMap, SourceError> {
        Ok(self.entries.clone())
    }

    fn location(&self) -> String {
        MEMORY_LOCATION.to_string()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Memory
    }
}
