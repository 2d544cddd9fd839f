//! Watch command - stream change and error events until interrupted.

use anyhow::Result;
use clap::Args;
use config::{ChangeEvent, ConfigEvent, Configuration, is_secret_key, mask_value};
use std::process::ExitCode;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use crate::output;

#[derive(Args)]
pub struct WatchArgs {
    /// Print secret values in clear text
    #[arg(long)]
    pub no_mask: bool,
}

pub async fn run(config: &Configuration, args: &WatchArgs) -> Result<ExitCode> {
    let mut events = config.subscribe();
    let watched = config.file_paths();
    if watched.is_empty() {
        output::warn("no files to watch; pass --file or --optional-file");
    }
    for path in &watched {
        output::info(&format!("watching {}", path.display()));
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ConfigEvent::Changed(change)) => print_change(config, &change, !args.no_mask),
                Ok(ConfigEvent::Error(failure)) => {
                    output::error(&format!("{}: {}", failure.location, failure.error));
                }
                Err(RecvError::Lagged(skipped)) => {
                    output::warn(&format!("missed {} event(s)", skipped));
                }
                Err(RecvError::Closed) => break,
            },
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, stopping watch");
                break;
            }
        }
    }

    config.shutdown();
    Ok(ExitCode::SUCCESS)
}

fn print_change(config: &Configuration, change: &ChangeEvent, mask: bool) {
    let hints = config.secret_hints();
    let show = |key: &str, value: &str| {
        if mask && is_secret_key(key, &hints) {
            mask_value(value)
        } else {
            value.to_string()
        }
    };

    output::change_source(&change.location, change.source_kind.tag());
    for (key, value) in &change.changes.added {
        output::added(key.as_str(), &show(key.as_str(), value));
    }
    for (key, value) in &change.changes.modified {
        output::modified(
            key.as_str(),
            &show(key.as_str(), &value.old),
            &show(key.as_str(), &value.new),
        );
    }
    for key in &change.changes.removed {
        output::removed(key.as_str());
    }
}
