//! Dump command - print every merged key.

use anyhow::Result;
use clap::Args;
use config::Configuration;
use std::process::ExitCode;

#[derive(Args)]
pub struct DumpArgs {
    /// Print secret values in clear text
    #[arg(long)]
    pub no_mask: bool,
}

pub fn run(config: &Configuration, args: &DumpArgs) -> Result<ExitCode> {
    print!("{}", config.dump_with(!args.no_mask));
    Ok(ExitCode::SUCCESS)
}
