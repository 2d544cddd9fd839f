//! Command-line argument ingestion.
//!
//! Recognised forms:
//! - `--key=value` / `-key=value` (split on the first `=` only)
//! - `--key value` when the next token does not start with `-`
//! - `--flag` alone, stored as `"true"`
//!
//! Tokens that are not keys and were not consumed as values are ignored.
//! A value that itself starts with `-` (such as a negative number) must use
//! the `=` form.

use crate::key::FlatMap;
use crate::source::{ConfigSource, SourceKind};
use errors::SourceError;

/// Synthetic location of the command-line layer.
pub const COMMAND_LINE_LOCATION: &str = "<CommandLine>";

fn strip_hyphens(token: &str) -> Option<&str> {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
}

/// Parses an argument vector into a flat mapping. Later occurrences of a key
/// overwrite earlier ones.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> FlatMap {
    let mut map = FlatMap::new();
    let mut index = 0;

    while index < args.len() {
        let token = args[index].as_ref();
        index += 1;

        let Some(body) = strip_hyphens(token) else {
            continue;
        };

        let (key, value) = match body.split_once('=') {
            Some((key, value)) => (key, value.to_string()),
            None => match args.get(index).map(AsRef::as_ref) {
                Some(next) if !next.starts_with('-') => {
                    index += 1;
                    (body, next.to_string())
                }
                _ => (body, "true".to_string()),
            },
        };

        if key.is_empty() {
            continue;
        }
        map.insert(key.into(), value);
    }

    map
}

/// Configuration source over a captured argument vector.
#[derive(Debug, Clone, Default)]
pub struct CommandLineSource {
    args: Vec<String>,
}

impl CommandLineSource {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl ConfigSource for CommandLineSource {
    fn load(&self) -> Result<FlatMap, SourceError> {
        Ok(parse_args(&self.args))
    }

    fn location(&self) -> String {
        COMMAND_LINE_LOCATION.to_string()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::CommandLine
    }
}
