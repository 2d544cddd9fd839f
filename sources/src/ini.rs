//! INI text parsing.
//!
//! `[Section]` headers prefix the keys that follow them; nested sections use
//! the key delimiter (`[Database:Replica]`). Lines starting with `;`, `#` or
//! `/` are comments.

use crate::file_loader::Flattener;
use crate::key::{FlatMap, combine};
use errors::SourceError;

pub fn parse_ini(contents: &str, location: &str) -> Result<FlatMap, SourceError> {
    let mut out = Flattener::new(location);
    let mut section = String::new();

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        let line_number = index + 1;

        if line.is_empty() || line.starts_with([';', '#', '/']) {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let Some(name) = header.strip_suffix(']') else {
                return Err(out.parse_error(
                    "INI",
                    format!("unterminated section header on line {}", line_number),
                ));
            };
            section = name.trim().to_string();
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(out.parse_error(
                "INI",
                format!("expected 'key=value' on line {}", line_number),
            ));
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(out.parse_error("INI", format!("empty key on line {}", line_number)));
        }

        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);

        out.insert(combine(&section, key), value.to_string())?;
    }

    Ok(out.finish())
}
