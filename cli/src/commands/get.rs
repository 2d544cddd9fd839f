//! Get command - print one value.

use anyhow::Result;
use clap::Args;
use config::{ConfigReader, Configuration};
use std::process::ExitCode;

use crate::ux_error;

#[derive(Args)]
pub struct GetArgs {
    /// Key to look up, e.g. Server:Port (case-insensitive)
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Value printed when the key is absent
    #[arg(long)]
    pub default: Option<String>,
}

pub fn run(config: &Configuration, args: &GetArgs) -> Result<ExitCode> {
    match config.get(&args.key).or_else(|| args.default.clone()) {
        Some(value) => {
            println!("{}", value);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            ux_error::key_not_found(&args.key).display();
            Ok(ExitCode::FAILURE)
        }
    }
}
