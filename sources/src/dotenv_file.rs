//! Dotenv file loading.
//!
//! Lines are parsed by the `dotenv` crate (quotes, comments and `$VAR`
//! substitution); variable names are mapped to keys the same way as process
//! environment variables, so `DATABASE__HOST` becomes `DATABASE:HOST`.

use crate::file_loader::Flattener;
use crate::key::FlatMap;
use crate::loader::env_name_to_key;
use errors::SourceError;
use std::io::ErrorKind;
use std::path::Path;

pub fn load_dotenv(path: &Path, location: &str) -> Result<FlatMap, SourceError> {
    let mut out = Flattener::new(location);

    let entries = dotenv::from_path_iter(path).map_err(|e| match e {
        dotenv::Error::Io(io) if io.kind() == ErrorKind::NotFound => SourceError::NotFound {
            location: location.to_string(),
        },
        dotenv::Error::Io(io) => SourceError::Io {
            location: location.to_string(),
            reason: io.to_string(),
        },
        other => out.parse_error("dotenv", other),
    })?;

    for entry in entries {
        let (name, value) = entry.map_err(|e| out.parse_error("dotenv", e))?;
        if let Some(key) = env_name_to_key(&name) {
            out.insert(key, value)?;
        }
    }

    Ok(out.finish())
}
