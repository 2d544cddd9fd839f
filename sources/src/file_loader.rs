//! # Configuration File Loading
//!
//! Loads configuration from JSON, YAML, TOML, INI or dotenv files and
//! flattens nested structure into `:`-separated keys.
//!
//! Supports automatic format detection based on file extension.

use crate::dotenv_file;
use crate::ini;
use crate::key::{ConfigKey, FlatMap, combine};
use crate::source::{ConfigSource, SourceKind};
use errors::SourceError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Text format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
    Ini,
    DotEnv,
}

impl FileFormat {
    /// Detects the format from the file extension.
    ///
    /// A file named exactly `.env` is treated as dotenv.
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.file_name().is_some_and(|name| name == ".env") {
            return Some(Self::DotEnv);
        }
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "ini" => Some(Self::Ini),
            "env" => Some(Self::DotEnv),
            _ => None,
        }
    }

    pub fn kind(self) -> SourceKind {
        match self {
            Self::Json => SourceKind::Json,
            Self::Yaml => SourceKind::Yaml,
            Self::Toml => SourceKind::Toml,
            Self::Ini => SourceKind::Ini,
            Self::DotEnv => SourceKind::DotEnv,
        }
    }
}

/// A file-backed configuration source.
///
/// ## Usage
/// ```rust,no_run
/// use sources::{ConfigSource, FileSource};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = FileSource::detect("appsettings.json")?.reload_on_change(true);
///     let data = source.load()?;
///     println!("{} keys", data.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: FileFormat,
    optional: bool,
    reload_on_change: bool,
}

impl FileSource {
    /// Creates a source for `path` in an explicit format. Relative paths are
    /// resolved against the current directory.
    pub fn new(path: impl AsRef<Path>, format: FileFormat) -> Self {
        let path = path.as_ref();
        Self {
            path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            format,
            optional: false,
            reload_on_change: false,
        }
    }

    /// Creates a source whose format is detected from the file extension.
    pub fn detect(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path).ok_or_else(|| SourceError::UnsupportedFormat {
            location: path.display().to_string(),
        })?;
        Ok(Self::new(path, format))
    }

    /// An optional file that does not exist loads as an empty mapping.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn reload_on_change(mut self, reload_on_change: bool) -> Self {
        self.reload_on_change = reload_on_change;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Maps a missing file to an empty mapping when the source is optional.
    fn settle(&self, parsed: Result<FlatMap, SourceError>) -> Result<FlatMap, SourceError> {
        match parsed {
            Err(SourceError::NotFound { .. }) if self.optional => {
                debug!("Optional configuration file {:?} not found", self.path);
                Ok(FlatMap::new())
            }
            other => other,
        }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<FlatMap, SourceError> {
        let location = self.location();
        let parse: fn(&str, &str) -> Result<FlatMap, SourceError> = match self.format {
            FileFormat::Json => parse_json,
            FileFormat::Yaml => parse_yaml,
            FileFormat::Toml => parse_toml,
            FileFormat::Ini => ini::parse_ini,
            FileFormat::DotEnv => {
                return self.settle(dotenv_file::load_dotenv(&self.path, &location));
            }
        };
        let parsed = read_text(&self.path, &location).and_then(|text| parse(&text, &location));
        self.settle(parsed)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn kind(&self) -> SourceKind {
        self.format.kind()
    }

    fn supports_reload(&self) -> bool {
        self.reload_on_change
    }
}

fn read_text(path: &Path, location: &str) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SourceError::NotFound {
            location: location.to_string(),
        },
        _ => SourceError::Io {
            location: location.to_string(),
            reason: e.to_string(),
        },
    })
}

/// Accumulates flattened entries, rejecting keys that collide when compared
/// case-insensitively.
pub(crate) struct Flattener<'a> {
    location: &'a str,
    map: FlatMap,
}

impl<'a> Flattener<'a> {
    pub(crate) fn new(location: &'a str) -> Self {
        Self {
            location,
            map: FlatMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: String, value: String) -> Result<(), SourceError> {
        let key = ConfigKey::from(key);
        if self.map.contains_key(&key) {
            return Err(SourceError::DuplicateKey {
                location: self.location.to_string(),
                key: key.into_string(),
            });
        }
        self.map.insert(key, value);
        Ok(())
    }

    pub(crate) fn parse_error(&self, format: &str, reason: impl ToString) -> SourceError {
        SourceError::Parse {
            location: self.location.to_string(),
            format: format.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn finish(self) -> FlatMap {
        self.map
    }
}

/// Parses JSON text into a flat mapping. The document root must be an object.
pub fn parse_json(contents: &str, location: &str) -> Result<FlatMap, SourceError> {
    let mut out = Flattener::new(location);
    let root: serde_json::Value =
        serde_json::from_str(contents).map_err(|e| out.parse_error("JSON", e))?;
    if !root.is_object() {
        return Err(out.parse_error("JSON", "top-level value must be an object"));
    }
    flatten_json(&root, "", &mut out)?;
    Ok(out.finish())
}

fn flatten_json(
    value: &serde_json::Value,
    prefix: &str,
    out: &mut Flattener<'_>,
) -> Result<(), SourceError> {
    use serde_json::Value;

    match value {
        Value::Object(map) if map.is_empty() && !prefix.is_empty() => {
            out.insert(prefix.to_string(), String::new())
        }
        Value::Object(map) => {
            for (key, child) in map {
                flatten_json(child, &combine(prefix, key), out)?;
            }
            Ok(())
        }
        Value::Array(items) if items.is_empty() => out.insert(prefix.to_string(), String::new()),
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_json(child, &combine(prefix, &index.to_string()), out)?;
            }
            Ok(())
        }
        Value::Null => out.insert(prefix.to_string(), String::new()),
        Value::String(s) => out.insert(prefix.to_string(), s.clone()),
        Value::Bool(b) => out.insert(prefix.to_string(), b.to_string()),
        Value::Number(n) => out.insert(prefix.to_string(), n.to_string()),
    }
}

/// Parses YAML text into a flat mapping. An empty document yields an empty
/// mapping.
pub fn parse_yaml(contents: &str, location: &str) -> Result<FlatMap, SourceError> {
    let mut out = Flattener::new(location);
    let root: serde_yaml::Value =
        serde_yaml::from_str(contents).map_err(|e| out.parse_error("YAML", e))?;
    match root {
        serde_yaml::Value::Null => {}
        serde_yaml::Value::Mapping(_) => flatten_yaml(&root, "", &mut out)?,
        _ => return Err(out.parse_error("YAML", "top-level value must be a mapping")),
    }
    Ok(out.finish())
}

fn flatten_yaml(
    value: &serde_yaml::Value,
    prefix: &str,
    out: &mut Flattener<'_>,
) -> Result<(), SourceError> {
    use serde_yaml::Value;

    match value {
        Value::Mapping(map) if map.is_empty() && !prefix.is_empty() => {
            out.insert(prefix.to_string(), String::new())
        }
        Value::Mapping(map) => {
            for (key, child) in map {
                let segment = match key {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(out.parse_error(
                            "YAML",
                            format!("unsupported mapping key {:?} under '{}'", other, prefix),
                        ));
                    }
                };
                flatten_yaml(child, &combine(prefix, &segment), out)?;
            }
            Ok(())
        }
        Value::Sequence(items) if items.is_empty() => {
            out.insert(prefix.to_string(), String::new())
        }
        Value::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_yaml(child, &combine(prefix, &index.to_string()), out)?;
            }
            Ok(())
        }
        Value::Tagged(tagged) => flatten_yaml(&tagged.value, prefix, out),
        Value::Null => out.insert(prefix.to_string(), String::new()),
        Value::String(s) => out.insert(prefix.to_string(), s.clone()),
        Value::Bool(b) => out.insert(prefix.to_string(), b.to_string()),
        Value::Number(n) => out.insert(prefix.to_string(), n.to_string()),
    }
}

/// Parses TOML text into a flat mapping.
pub fn parse_toml(contents: &str, location: &str) -> Result<FlatMap, SourceError> {
    let mut out = Flattener::new(location);
    let root: toml::Table = toml::from_str(contents).map_err(|e| out.parse_error("TOML", e))?;
    for (key, child) in &root {
        flatten_toml(child, key, &mut out)?;
    }
    Ok(out.finish())
}

fn flatten_toml(
    value: &toml::Value,
    prefix: &str,
    out: &mut Flattener<'_>,
) -> Result<(), SourceError> {
    use toml::Value;

    match value {
        Value::Table(table) if table.is_empty() => out.insert(prefix.to_string(), String::new()),
        Value::Table(table) => {
            for (key, child) in table {
                flatten_toml(child, &combine(prefix, key), out)?;
            }
            Ok(())
        }
        Value::Array(items) if items.is_empty() => out.insert(prefix.to_string(), String::new()),
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_toml(child, &combine(prefix, &index.to_string()), out)?;
            }
            Ok(())
        }
        Value::String(s) => out.insert(prefix.to_string(), s.clone()),
        Value::Integer(i) => out.insert(prefix.to_string(), i.to_string()),
        Value::Float(f) => out.insert(prefix.to_string(), f.to_string()),
        Value::Boolean(b) => out.insert(prefix.to_string(), b.to_string()),
        Value::Datetime(dt) => out.insert(prefix.to_string(), dt.to_string()),
    }
}
