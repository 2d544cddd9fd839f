//! Layers command - registered sources in precedence order.

use anyhow::Result;
use clap::Args;
use config::Configuration;
use std::process::ExitCode;

use crate::output;

#[derive(Args)]
pub struct LayersArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(config: &Configuration, args: &LayersArgs) -> Result<ExitCode> {
    let layers = config.layers();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&layers)?);
        return Ok(ExitCode::SUCCESS);
    }

    if layers.is_empty() {
        output::hint("no layers; pass --file, --env or --set");
        return Ok(ExitCode::SUCCESS);
    }

    output::header("Layers (lowest precedence first)");
    println!("  {:<6} {:<12} {:>5}  LOCATION", "ORDER", "KIND", "KEYS");
    for layer in &layers {
        println!(
            "  {:<6} {:<12} {:>5}  {}",
            layer.order,
            layer.kind.tag(),
            layer.key_count,
            layer.location
        );
    }
    Ok(ExitCode::SUCCESS)
}
