//! # Environment Variable Loader
//!
//! Loads configuration from process environment variables following
//! 12-factor app principles.
//!
//! # Naming Convention
//! - A double underscore (`__`) separates path segments:
//!   `DATABASE__HOST` becomes `DATABASE:HOST`.
//! - With a prefix filter, only variables starting with the prefix
//!   (case-insensitive) are kept and the prefix is stripped first.

use crate::key::{FlatMap, KEY_DELIMITER};
use crate::source::{ConfigSource, SourceKind};
use errors::SourceError;
use std::env;

/// Synthetic location of the environment layer.
pub const ENVIRONMENT_LOCATION: &str = "<EnvironmentVariables>";

/// Maps an environment variable name to a configuration key.
///
/// Returns `None` when nothing is left after mapping.
pub(crate) fn env_name_to_key(name: &str) -> Option<String> {
    let key = name.replace("__", &KEY_DELIMITER.to_string());
    let key = key.trim_start_matches(KEY_DELIMITER);
    (!key.is_empty()).then(|| key.to_string())
}

/// Flattens environment variables, applying an optional name prefix filter.
///
/// ## Usage
/// ```rust
/// use sources::{ConfigKey, flatten_environment};
///
/// let vars = vec![
///     ("APP_SERVER__PORT".to_string(), "8080".to_string()),
///     ("PATH".to_string(), "/usr/bin".to_string()),
/// ];
/// let map = flatten_environment(vars, Some("app_"));
/// assert_eq!(map.get(&ConfigKey::from("server:port")).unwrap(), "8080");
/// assert_eq!(map.len(), 1);
/// ```
pub fn flatten_environment<I>(vars: I, prefix: Option<&str>) -> FlatMap
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut map = FlatMap::new();

    for (name, value) in vars {
        let stripped = match prefix {
            Some(prefix) => match name.get(..prefix.len()) {
                Some(head) if head.eq_ignore_ascii_case(prefix) => &name[prefix.len()..],
                _ => continue,
            },
            None => name.as_str(),
        };

        if let Some(key) = env_name_to_key(stripped) {
            map.insert(key.into(), value);
        }
    }

    map
}

/// Configuration source reading the full process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSource {
    prefix: Option<String>,
}

impl EnvironmentSource {
    pub fn new(prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl ConfigSource for EnvironmentSource {
    fn load(&self) -> Result<FlatMap, SourceError> {
        // Variables that are not valid unicode cannot be represented as keys.
        let vars = env::vars_os().filter_map(|(name, value)| {
            Some((name.into_string().ok()?, value.into_string().ok()?))
        });
        Ok(flatten_environment(vars, self.prefix.as_deref()))
    }

    fn location(&self) -> String {
        ENVIRONMENT_LOCATION.to_string()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ConfigKey;
    use serial_test::serial;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_double_underscore_is_separator() {
        let map = flatten_environment(vars(&[("Logging__Level__Default", "Warn")]), None);
        assert_eq!(
            map.get(&ConfigKey::from("logging:level:default")).unwrap(),
            "Warn"
        );
    }

    #[test]
    fn test_prefix_is_case_insensitive_and_stripped() {
        let map = flatten_environment(
            vars(&[
                ("myapp_Server__Port", "5000"),
                ("MYAPP_Name", "svc"),
                ("OTHER_Name", "x"),
            ]),
            Some("MyApp_"),
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&ConfigKey::from("Server:Port")).unwrap(), "5000");
        assert_eq!(map.get(&ConfigKey::from("Name")).unwrap(), "svc");
    }

    #[test]
    fn test_leading_separator_trimmed() {
        let map = flatten_environment(vars(&[("APP__Server__Port", "1")]), Some("APP"));
        assert_eq!(map.get(&ConfigKey::from("Server:Port")).unwrap(), "1");
    }

    #[test]
    fn test_empty_name_discarded() {
        let map = flatten_environment(vars(&[("APP_", "1"), ("APP___", "2")]), Some("APP_"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_short_names_do_not_match_prefix() {
        let map = flatten_environment(vars(&[("AP", "1")]), Some("APP_"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_empty_prefix_means_no_filter() {
        let source = EnvironmentSource::new(Some(""));
        assert_eq!(source.prefix(), None);
    }

    #[test]
    #[serial]
    fn test_environment_source_reads_process_env() {
        unsafe {
            std::env::set_var("STRATA_TEST_Cache__Size", "128");
        }

        let source = EnvironmentSource::new(Some("STRATA_TEST_"));
        let map = source.load().unwrap();

        unsafe {
            std::env::remove_var("STRATA_TEST_Cache__Size");
        }

        assert_eq!(source.location(), "<EnvironmentVariables>");
        assert!(source.is_dynamic());
        assert!(!source.supports_reload());
        assert_eq!(map.get(&ConfigKey::from("cache:size")).unwrap(), "128");
    }
}
