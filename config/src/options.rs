//! # Aggregator Options
//!
//! Settings that govern the aggregator itself rather than the application
//! configuration it serves.

use errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Key-name fragments whose values are masked in dumps.
pub const DEFAULT_SECRET_HINTS: &[&str] = &[
    "password",
    "pwd",
    "secret",
    "token",
    "apikey",
    "api_key",
    "key",
    "private",
    "connectionstring",
];

/// Options for a [`crate::Configuration`] instance.
///
/// ## Fields
/// - `debounce_ms`: quiet period before a watched file is reloaded
///   (default: 50)
/// - `secret_hints`: case-insensitive key fragments that trigger masking
///   (default: [`DEFAULT_SECRET_HINTS`])
/// - `mask_secrets`: whether `dump()` masks by default (default: true)
/// - `event_capacity`: buffered events per subscriber (default: 64)
///
/// ## Validation
/// - `debounce_ms`: 1-10000
/// - `event_capacity`: 1-65536
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ConfigOptions {
    #[validate(range(min = 1, max = 10000))]
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_secret_hints")]
    pub secret_hints: Vec<String>,

    #[serde(default = "default_true")]
    pub mask_secrets: bool,

    #[validate(range(min = 1, max = 65536))]
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl ConfigOptions {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_secret_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secret_hints = hints.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mask_secrets(mut self, mask: bool) -> Self {
        self.mask_secrets = mask;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub(crate) fn checked(self) -> Result<Self, ConfigError> {
        self.validate().map_err(|e| ConfigError::InvalidOptions {
            reason: e.to_string(),
        })?;
        Ok(self)
    }
}

fn default_debounce_ms() -> u64 {
    50
}

fn default_secret_hints() -> Vec<String> {
    DEFAULT_SECRET_HINTS.iter().map(|h| (*h).to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    64
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            secret_hints: default_secret_hints(),
            mask_secrets: true,
            event_capacity: default_event_capacity(),
        }
    }
}
