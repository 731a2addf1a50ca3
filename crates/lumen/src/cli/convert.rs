//! The `lumen convert` command.

use clap::Args;
use lumen_core::{Config, Lumen};
use serde_json::json;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use super::input::InputArgs;

/// Arguments for the `convert` command.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format, by extension (png, jpeg, webp, gif, bmp, tiff, ...)
    #[arg(short, long, default_value = "png")]
    pub format: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the convert command.
pub async fn execute(args: ConvertArgs, config: Config) -> anyhow::Result<()> {
    let lumen = Lumen::new(config);
    let mut pipeline = args.input.open(&lumen)?;
    pipeline.set_operation("format", json!(args.format));

    let pending = tokio::spawn(pipeline.to_buffer());
    args.input.feed(&pipeline).await?;
    let encoded = pending.await??;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &encoded).await?;
            tracing::info!(bytes = encoded.len(), "Wrote {}", path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&encoded).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
