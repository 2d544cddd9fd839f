//! Export command - merged configuration as a JSON object.

use anyhow::Result;
use clap::Args;
use config::Configuration;
use std::process::ExitCode;

#[derive(Args)]
pub struct ExportArgs {
    /// Export only keys under this section, relative to it
    #[arg(long, value_name = "PREFIX")]
    pub section: Option<String>,

    /// Single-line output
    #[arg(long)]
    pub compact: bool,
}

pub fn run(config: &Configuration, args: &ExportArgs) -> Result<ExitCode> {
    let snapshot = match &args.section {
        Some(prefix) => config.section(prefix).snapshot(),
        None => config.snapshot(),
    };

    let json = if args.compact {
        serde_json::to_string(&snapshot)?
    } else {
        serde_json::to_string_pretty(&snapshot)?
    };
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}
