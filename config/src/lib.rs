//! # Strata Configuration
//!
//! Layered configuration for long-running services.
//!
//! This crate provides:
//! - An ordered stack of configuration layers (files, environment, command
//!   line, in-memory) merged with later-wins precedence
//! - Case-insensitive, colon-delimited keys (`Server:Port`)
//! - Live reload of watched files with change and error notifications
//! - Lenient typed getters, requirement checks, masked dumps
//! - Section views and structured binding onto `serde` types
//!
//! # Concurrency
//!
//! Queries take a shared lock and observe one consistent snapshot. Reloads
//! load outside the lock and swap the merged snapshot atomically.

mod binder;
pub mod configuration;
pub mod diff;
mod dump;
pub mod events;
mod hot_reload;
pub mod layer;
pub mod options;
pub mod parse;
pub mod precedence;
pub mod query;
pub mod section;

pub use configuration::{Configuration, FileOptions};
pub use diff::{ChangeRecord, ValueChange};
pub use dump::{is_secret_key, mask_value};
pub use errors::{BindError, ConfigError, SourceError};
pub use events::{ChangeEvent, ConfigEvent, ErrorEvent};
pub use layer::{LayerInfo, WatchState};
pub use options::{ConfigOptions, DEFAULT_SECRET_HINTS};
pub use query::ConfigReader;
pub use section::{OwnedSection, Section};
pub use sources::{ConfigKey, ConfigSource, FlatMap, SourceKind};
pub use validator::Validate;
