//! Input arguments shared by commands that open a pipeline.

use clap::Args;
use lumen_core::{Input, InputOptions, Lumen, Pipeline};

/// Placeholder path that reads the image from stdin.
pub const STDIN: &str = "-";

/// Where the image comes from and how to interpret it.
#[derive(Args, Debug, Default)]
pub struct InputArgs {
    /// Image file, or `-` to stream from stdin
    #[arg(required = true)]
    pub input: String,

    /// Density hint for vector formats, in DPI (1-2400)
    #[arg(long)]
    pub density: Option<i64>,

    /// Treat the input as raw pixels: WIDTHxHEIGHTxCHANNELS
    #[arg(long, value_parser = parse_raw)]
    pub raw: Option<InputOptions>,

    /// Pixel limit (0 disables the check)
    #[arg(long)]
    pub limit_pixels: Option<i64>,

    /// Hint that the input should be read top to bottom
    #[arg(long)]
    pub sequential: bool,
}

impl InputArgs {
    pub fn is_stdin(&self) -> bool {
        self.input == STDIN
    }

    /// Build the input options from `--density` and `--raw`.
    pub fn options(&self) -> Option<InputOptions> {
        if self.density.is_none() && self.raw.is_none() {
            return None;
        }
        let mut options = self.raw.clone().unwrap_or_default();
        options.density = self.density;
        Some(options)
    }

    /// Open a pipeline for these arguments. Stdin input is not read yet.
    pub fn open(&self, lumen: &Lumen) -> anyhow::Result<Pipeline> {
        let input = if self.is_stdin() {
            Input::Stream
        } else {
            Input::from(shellexpand::tilde(&self.input).into_owned())
        };
        let mut pipeline = lumen.open_with(input, self.options().as_ref())?;
        if let Some(limit) = self.limit_pixels {
            pipeline.limit_input_pixels(limit)?;
        }
        if self.sequential {
            pipeline.sequential_read(true);
        }
        Ok(pipeline)
    }

    /// Deliver stdin to `pipeline` when reading from stdin.
    pub async fn feed(&self, pipeline: &Pipeline) -> anyhow::Result<()> {
        if self.is_stdin() {
            let bytes = pipeline.pipe_from(tokio::io::stdin()).await?;
            tracing::debug!(bytes = bytes.len(), "Read input from stdin");
        }
        Ok(())
    }
}

/// Parse `WIDTHxHEIGHTxCHANNELS`. Range checks happen when the pipeline opens.
fn parse_raw(value: &str) -> Result<InputOptions, String> {
    let parts: Vec<&str> = value.split(['x', 'X']).collect();
    let [width, height, channels] = parts.as_slice() else {
        return Err(format!("expected WIDTHxHEIGHTxCHANNELS, got {value:?}"));
    };
    let parse = |name: &str, s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid {name} {s:?}: {e}"))
    };
    Ok(InputOptions::raw(
        parse("width", width)?,
        parse("height", height)?,
        parse("channels", channels)?,
    ))
}
