//! The `lumen metadata` command.

use clap::Args;
use lumen_core::{Config, ImageMetadata, Lumen, Pipeline};

use super::input::InputArgs;

/// Arguments for the `metadata` command.
#[derive(Args, Debug, Default)]
pub struct MetadataArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Extra pipelines cloned from the first before any data is read
    #[arg(long, default_value = "0")]
    pub clones: usize,

    /// Print JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Execute the metadata command.
pub async fn execute(args: MetadataArgs, config: Config) -> anyhow::Result<()> {
    let lumen = Lumen::new(config);
    let pipeline = args.input.open(&lumen)?;

    // Queries are issued up front; for stdin they wait until the data is in.
    let mut pipelines = vec![pipeline.clone()];
    pipelines.extend((0..args.clones).map(|_| pipeline.clone()));
    let pending: Vec<_> = pipelines
        .iter()
        .map(Pipeline::metadata)
        .map(tokio::spawn)
        .collect();

    args.input.feed(&pipeline).await?;

    for (index, handle) in pending.into_iter().enumerate() {
        let metadata = handle.await??;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        } else {
            if args.clones > 0 {
                println!("[{}]", index);
            }
            print!("{}", summary(&metadata));
        }
    }

    Ok(())
}

fn summary(metadata: &ImageMetadata) -> String {
    let mut out = format!(
        "format:      {}\n\
         size:        {}x{}\n\
         space:       {}\n\
         channels:    {}\n\
         depth:       {}\n\
         alpha:       {}\n\
         icc profile: {}\n",
        metadata.format,
        metadata.width,
        metadata.height,
        metadata.space,
        metadata.channels,
        metadata.depth,
        metadata.has_alpha,
        metadata.has_profile,
    );
    if let Some(density) = metadata.density {
        out.push_str(&format!("density:     {} dpi\n", density));
    }
    if let Some(orientation) = metadata.orientation {
        out.push_str(&format!("orientation: {}\n", orientation));
    }
    out
}
