use colored::Colorize;

/// Error report shown to the user: what failed, why, and how to fix it.
#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
    pub suggested_command: Option<String>,
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why: None,
            how_to_fix: Vec::new(),
            suggested_command: None,
        }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn suggest(mut self, cmd: impl Into<String>) -> Self {
        self.suggested_command = Some(cmd.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.what.bold());

        if let Some(why) = &self.why {
            eprintln!("       {}", why.dimmed());
        }

        if !self.how_to_fix.is_empty() {
            eprintln!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, fix);
            }
        }

        if let Some(cmd) = &self.suggested_command {
            eprintln!("{}", "Try this:".green().bold());
            eprintln!("  $ {}", cmd.cyan());
        }
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn key_not_found(key: &str) -> UxError {
    UxError::new(format!("Key '{}' not found", key))
        .why("No layer defines this key (lookups ignore case)")
        .fix("Check the spelling and the ':' separators")
        .fix("Pass --default to print a fallback instead")
        .suggest("strata dump")
}

pub fn missing_keys(keys: &[String]) -> UxError {
    UxError::new(format!(
        "Missing required configuration keys: {}",
        keys.join(", ")
    ))
    .why(format!("{} required key(s) absent from every layer", keys.len()))
    .fix("Add the keys to a configuration file")
    .fix("Or supply them with --set KEY=VALUE")
}

pub fn load_failed(error: &anyhow::Error) -> UxError {
    UxError::new("Failed to load configuration")
        .why(format!("{:#}", error))
        .fix("Check that every --file exists and is well-formed")
        .fix("Use --optional-file for files that may be absent")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_lists_all() {
        let err = missing_keys(&["A".to_string(), "B".to_string()]);
        assert_eq!(err.to_string(), "Missing required configuration keys: A, B");
        assert_eq!(err.how_to_fix.len(), 2);
    }

    #[test]
    fn test_key_not_found_suggests_dump() {
        let err = key_not_found("Server:Port");
        assert!(err.what.contains("Server:Port"));
        assert_eq!(err.suggested_command.as_deref(), Some("strata dump"));
    }

    #[test]
    fn test_load_failed_includes_cause_chain() {
        let error = anyhow::anyhow!("file not found").context("loading app.json");
        let err = load_failed(&error);
        let why = err.why.unwrap();
        assert!(why.contains("loading app.json"));
        assert!(why.contains("file not found"));
    }

    #[test]
    fn test_display_does_not_panic() {
        UxError::new("boom").why("because").fix("retry").suggest("strata layers").display();
    }
}
