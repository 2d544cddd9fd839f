pub mod check;
pub mod dump;
pub mod export;
pub mod get;
pub mod layers;
pub mod watch;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use config::{Configuration, FileOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "strata",
    author,
    version,
    about = "Strata - layered configuration inspector",
    long_about = "Merges configuration files, environment variables and overrides the way a \
                  service would, then prints, queries or watches the result.\n\nLater sources \
                  win: files in the order given, then the environment, then --set overrides."
)]
pub struct Cli {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print every key, masking secrets")]
    Dump(dump::DumpArgs),

    #[command(about = "Print the value of one key")]
    Get(get::GetArgs),

    #[command(about = "Fail unless every given key is present")]
    Check(check::CheckArgs),

    #[command(about = "Print the merged configuration as JSON")]
    Export(export::ExportArgs),

    #[command(about = "List configuration layers in precedence order")]
    Layers(layers::LayersArgs),

    #[command(about = "Print changes as watched files are edited")]
    Watch(watch::WatchArgs),
}

#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Configuration file; format detected from the extension (repeatable)
    #[arg(short = 'f', long = "file", value_name = "PATH", global = true)]
    pub files: Vec<PathBuf>,

    /// Configuration file that may be absent (repeatable)
    #[arg(long = "optional-file", value_name = "PATH", global = true)]
    pub optional_files: Vec<PathBuf>,

    /// Include process environment variables
    #[arg(long, global = true)]
    pub env: bool,

    /// Include environment variables starting with PREFIX (prefix stripped)
    #[arg(long, value_name = "PREFIX", global = true)]
    pub env_prefix: Option<String>,

    /// Override a key, highest precedence (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    pub overrides: Vec<String>,
}

/// Registers every requested layer; file layers are watched when `watch`.
pub fn build(sources: &SourceArgs, watch: bool) -> Result<Configuration> {
    let config = Configuration::new();
    let required = FileOptions {
        optional: false,
        reload_on_change: watch,
    };
    let optional = FileOptions {
        optional: true,
        ..required
    };

    for path in &sources.files {
        config
            .add_file(path, required)
            .with_context(|| format!("loading {}", path.display()))?;
    }
    for path in &sources.optional_files {
        config
            .add_file(path, optional)
            .with_context(|| format!("loading {}", path.display()))?;
    }

    if sources.env || sources.env_prefix.is_some() {
        config.add_environment(sources.env_prefix.as_deref())?;
    }

    if !sources.overrides.is_empty() {
        let mut args = Vec::with_capacity(sources.overrides.len());
        for pair in &sources.overrides {
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    args.push(format!("--{}={}", key.trim(), value));
                }
                _ => bail!("invalid --set '{}': expected KEY=VALUE", pair),
            }
        }
        config.add_command_line(args)?;
    }

    Ok(config)
}
