//! # Strata Errors
//!
//! Error taxonomy for the layered configuration aggregator.
//!
//! - `SourceError`: a configuration source could not be read or parsed
//! - `ConfigError`: failures surfaced by the aggregator itself
//! - `BindError`: the merged tree could not be projected onto a target type
//!
//! Typed getters never produce errors; malformed values fall back to the
//! caller's default instead.

use std::fmt::Display;
use thiserror::Error;

/// Errors raised by a configuration source while producing its flat mapping.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Configuration source not found: {location}")]
    NotFound { location: String },

    #[error("Failed to read {location}: {reason}")]
    Io { location: String, reason: String },

    #[error("Failed to parse {format} in {location}: {reason}")]
    Parse {
        location: String,
        format: String,
        reason: String,
    },

    #[error("Duplicate key '{key}' in {location}")]
    DuplicateKey { location: String, key: String },

    #[error("Unsupported configuration file format: {location}")]
    UnsupportedFormat { location: String },
}

impl SourceError {
    /// Location (file path or synthetic marker) the error refers to.
    pub fn location(&self) -> &str {
        match self {
            Self::NotFound { location }
            | Self::Io { location, .. }
            | Self::Parse { location, .. }
            | Self::DuplicateKey { location, .. }
            | Self::UnsupportedFormat { location } => location,
        }
    }
}

/// Errors surfaced by the configuration aggregator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Failed to load configuration layer {location}: {source}")]
    Load {
        location: String,
        #[source]
        source: SourceError,
    },

    #[error("Missing required configuration keys: {}", keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    #[error("Failed to watch {location}: {reason}")]
    Watch { location: String, reason: String },

    #[error("Invalid aggregator options: {reason}")]
    InvalidOptions { reason: String },

    #[error("Configuration has been shut down")]
    Disposed,

    #[error(transparent)]
    Bind(#[from] BindError),
}

impl ConfigError {
    /// Wraps a source failure with the location of the layer being loaded.
    pub fn load(source: SourceError) -> Self {
        Self::Load {
            location: source.location().to_string(),
            source,
        }
    }
}

/// Errors raised while projecting a configuration subtree onto a typed value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("Invalid value '{value}' at '{path}': expected {expected}")]
    InvalidValue {
        path: String,
        value: String,
        expected: String,
    },

    #[error("Expected a value at '{path}' but found a section")]
    ExpectedValue { path: String },

    #[error("Unknown variant '{value}' at '{path}'")]
    UnknownVariant { path: String, value: String },

    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("{message}")]
    Custom { message: String },
}

impl serde::de::Error for BindError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom {
            message: msg.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_lists_every_key() {
        let error = ConfigError::MissingKeys {
            keys: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Missing required configuration keys: A, B"
        );
    }

    #[test]
    fn test_load_error_carries_location() {
        let error = ConfigError::load(SourceError::NotFound {
            location: "/etc/app.json".to_string(),
        });
        match &error {
            ConfigError::Load { location, .. } => assert_eq!(location, "/etc/app.json"),
            other => panic!("Expected Load error, got {:?}", other),
        }
        assert!(error.to_string().contains("/etc/app.json"));
    }

    #[test]
    fn test_bind_error_custom_from_serde() {
        let error = <BindError as serde::de::Error>::missing_field("port");
        assert!(error.to_string().contains("port"));
    }
}
