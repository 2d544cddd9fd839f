use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
mod ux_error;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let watch = matches!(cli.command, Commands::Watch(_));
    let config = match commands::build(&cli.sources, watch) {
        Ok(config) => config,
        Err(e) => {
            ux_error::load_failed(&e).display();
            return Ok(ExitCode::FAILURE);
        }
    };

    match cli.command {
        Commands::Dump(args) => commands::dump::run(&config, &args),
        Commands::Get(args) => commands::get::run(&config, &args),
        Commands::Check(args) => commands::check::run(&config, &args),
        Commands::Export(args) => commands::export::run(&config, &args),
        Commands::Layers(args) => commands::layers::run(&config, &args),
        Commands::Watch(args) => commands::watch::run(&config, &args).await,
    }
}
