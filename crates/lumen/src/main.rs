//! Lumen CLI - inspect and convert images through deferred pipelines.
//!
//! Inputs are file paths or `-` for stdin. Stdin is streamed into the
//! pipeline frame by frame, so queries issued before the data arrives wait
//! for it.
//!
//! # Usage
//!
//! ```bash
//! # Header metadata for a file
//! lumen metadata photo.jpg
//!
//! # Stream stdin into three pipelines sharing one input
//! cat photo.jpg | lumen metadata - --clones 2 --json
//!
//! # Re-encode
//! lumen convert photo.jpg --format png -o photo.png
//!
//! # View configuration
//! lumen config show
//! ```

use clap::{Parser, Subcommand};
use lumen_core::Config;
use std::path::PathBuf;

mod cli;
mod logging;

/// Lumen - deferred, composable image pipelines.
#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "LUMEN_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print header metadata for an image
    Metadata(cli::metadata::MetadataArgs),

    /// Re-encode an image into another format
    Convert(cli::convert::ConvertArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()));

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `lumen config path`."
            );
            Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Lumen v{}", lumen_core::VERSION);

    match cli.command {
        Commands::Metadata(args) => cli::metadata::execute(args, config).await,
        Commands::Convert(args) => cli::convert::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, config_path).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config, lumen_core::ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
