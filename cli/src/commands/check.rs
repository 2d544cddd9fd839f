//! Check command - requirement validation.
//!
//! Reports every missing key at once rather than stopping at the first.

use anyhow::Result;
use clap::Args;
use config::{ConfigError, Configuration};
use std::process::ExitCode;

use crate::{output, ux_error};

#[derive(Args)]
pub struct CheckArgs {
    /// Keys that must be present
    #[arg(value_name = "KEY", required = true)]
    pub keys: Vec<String>,
}

pub fn run(config: &Configuration, args: &CheckArgs) -> Result<ExitCode> {
    match config.require_keys(&args.keys) {
        Ok(()) => {
            output::success(&format!("All {} required key(s) present", args.keys.len()));
            Ok(ExitCode::SUCCESS)
        }
        Err(ConfigError::MissingKeys { keys }) => {
            ux_error::missing_keys(&keys).display();
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
