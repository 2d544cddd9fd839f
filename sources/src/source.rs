//! # Source Capability
//!
//! The narrow interface the aggregator requires of every configuration
//! source.

use crate::key::FlatMap;
use errors::SourceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a configuration source, used as the source-type tag on change
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Json,
    Yaml,
    Toml,
    Ini,
    #[serde(rename = "env")]
    DotEnv,
    Environment,
    CommandLine,
    Memory,
}

impl SourceKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Ini => "ini",
            Self::DotEnv => "env",
            Self::Environment => "environment",
            Self::CommandLine => "commandline",
            Self::Memory => "memory",
        }
    }

    /// Whether the kind is backed by a file on disk.
    pub fn is_file(self) -> bool {
        matches!(
            self,
            Self::Json | Self::Yaml | Self::Toml | Self::Ini | Self::DotEnv
        )
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A configuration source: produces a flat mapping of `:`-separated keys to
/// string values.
///
/// Nested structure must be flattened before `load` returns. Implementations
/// are stateless per call and may be invoked repeatedly when
/// [`ConfigSource::supports_reload`] is true.
pub trait ConfigSource: Send + Sync {
    /// Load the current contents of the source.
    fn load(&self) -> Result<FlatMap, SourceError>;

    /// Absolute file path, or a synthetic marker such as
    /// `<EnvironmentVariables>`.
    fn location(&self) -> String;

    fn kind(&self) -> SourceKind;

    /// True for sources that should never be file-watched.
    fn is_dynamic(&self) -> bool {
        !self.kind().is_file()
    }

    /// Whether the source asks to be reloaded when its backing file changes.
    fn supports_reload(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(SourceKind::Json.tag(), "json");
        assert_eq!(SourceKind::DotEnv.tag(), "env");
        assert_eq!(SourceKind::CommandLine.to_string(), "commandline");
    }

    #[test]
    fn test_file_kinds() {
        assert!(SourceKind::Yaml.is_file());
        assert!(SourceKind::DotEnv.is_file());
        assert!(!SourceKind::Environment.is_file());
        assert!(!SourceKind::Memory.is_file());
    }

    #[test]
    fn test_kind_serializes_as_tag() {
        let json = serde_json::to_string(&SourceKind::DotEnv).unwrap();
        assert_eq!(json, "\"env\"");
        let json = serde_json::to_string(&SourceKind::CommandLine).unwrap();
        assert_eq!(json, "\"commandline\"");
    }
}
