//! # Configuration Sources
//!
//! Loaders that turn a configuration source into a flat mapping of
//! `:`-separated, case-insensitive keys to string values.
//!
//! This crate provides:
//! - JSON, YAML, TOML, INI and dotenv file sources (format auto-detection)
//! - Process environment variables with prefix filtering
//! - Command-line argument vectors
//! - In-memory entries
//!
//! Every loader flattens nested structure before returning, so consumers
//! never see nested shapes.

pub mod command_line;
pub mod dotenv_file;
pub mod file_loader;
pub mod ini;
pub mod key;
pub mod loader;
pub mod memory;
pub mod source;

pub use command_line::{COMMAND_LINE_LOCATION, CommandLineSource, parse_args};
pub use file_loader::{FileFormat, FileSource, parse_json, parse_toml, parse_yaml};
pub use ini::parse_ini;
pub use key::{ConfigKey, FlatMap, KEY_DELIMITER, combine, eq_ignore_case};
pub use loader::{ENVIRONMENT_LOCATION, EnvironmentSource, flatten_environment};
pub use memory::{MEMORY_LOCATION, MemorySource};
pub use source::{ConfigSource, SourceKind};
