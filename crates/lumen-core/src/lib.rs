//! Lumen Core - deferred, composable image pipelines.
//!
//! A pipeline is built from an input (a file path, a byte buffer, or a
//! stream of frames delivered later) and configured with options. Nothing
//! touches the image until a query runs. Clones of a stream pipeline share
//! one input: the bytes are collected once and every clone sees them.
//!
//! # Architecture
//!
//! ```text
//! Input → InputDescriptor → Pipeline ──clone──▶ Pipeline
//!                              │                  │
//!                   frames ─▶ SharedSource ◀──────┘
//!                              │ complete
//!                              ▼
//!                     ImageEngine::metadata / render
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen_core::{Config, Lumen};
//!
//! #[tokio::main]
//! async fn main() -> lumen_core::Result<()> {
//!     let lumen = Lumen::new(Config::load()?);
//!     let pipeline = lumen.stream();
//!     let copy = pipeline.clone();
//!
//!     let pending = copy.metadata();
//!     pipeline.pipe_from(tokio::io::stdin()).await?;
//!     println!("{:?}", pending.await?);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use engine::{ImageEngine, NativeEngine};
pub use error::{ConfigError, EngineError, InputError, InputResult, LumenError, Result};
pub use input::{Frame, Input, InputContext, InputDescriptor, InputOptions, Lifecycle};
pub use pipeline::{Operations, Pipeline, PixelLimit};
pub use types::ImageMetadata;

use serde_json::Value;
use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point: a configuration plus the engine every pipeline will use.
pub struct Lumen {
    config: Config,
    engine: Arc<dyn ImageEngine>,
}

impl Lumen {
    /// Create a new instance backed by the native engine.
    pub fn new(config: Config) -> Self {
        let engine = Arc::new(NativeEngine::new(config.engine.clone()));
        Self::with_engine(config, engine)
    }

    /// Create a new instance that dispatches to `engine`.
    pub fn with_engine(config: Config, engine: Arc<dyn ImageEngine>) -> Self {
        tracing::debug!("Initializing Lumen v{} with {} engine", VERSION, engine.name());
        Self { config, engine }
    }

    /// Create a new instance from the configuration file, if any.
    pub fn with_defaults() -> Result<Self> {
        let config = Config::load()?;
        Ok(Self::new(config))
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn ImageEngine> {
        &self.engine
    }

    /// Open a pipeline on `input` with no options.
    pub fn open(&self, input: impl Into<Input>) -> InputResult<Pipeline> {
        self.open_with(input, None)
    }

    /// Open a pipeline on `input` with typed options.
    pub fn open_with(
        &self,
        input: impl Into<Input>,
        options: Option<&InputOptions>,
    ) -> InputResult<Pipeline> {
        let descriptor = InputDescriptor::build(
            input.into(),
            options,
            InputContext::primary(),
            &self.config.limits,
        )?;
        Ok(self.wrap(descriptor))
    }

    /// Open a pipeline with options given as loosely typed JSON.
    pub fn open_value(&self, input: impl Into<Input>, options: &Value) -> InputResult<Pipeline> {
        let options = InputOptions::from_value(options)?;
        self.open_with(input, options.as_ref())
    }

    /// Open a pipeline whose input will be written to it later.
    pub fn stream(&self) -> Pipeline {
        self.wrap(InputDescriptor::stream_input(&self.config.limits))
    }

    fn wrap(&self, descriptor: InputDescriptor) -> Pipeline {
        Pipeline::from_descriptor(descriptor, Arc::clone(&self.engine), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use serde_json::json;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_lumen_new() {
        let lumen = Lumen::new(Config::default());
        assert_eq!(lumen.engine().name(), "native");
        assert_eq!(lumen.config().engine.timeout_ms, 5000);
    }

    #[test]
    fn test_open_value_validates_options() {
        let lumen = Lumen::new(Config::default());
        assert!(lumen.open_value("a.svg", &json!({ "density": 300 })).is_ok());
        assert!(lumen.open_value("a.svg", &Value::Null).is_ok());
        assert!(matches!(
            lumen.open_value("a.svg", &json!("fast")),
            Err(InputError::InvalidInputOptions { .. })
        ));
        assert!(matches!(
            lumen.open_value("a.svg", &json!({ "density": 72.5 })),
            Err(InputError::InvalidDensity { .. })
        ));
    }

    #[test]
    fn test_config_limit_applies_to_new_pipelines() {
        let mut config = Config::default();
        config.input.limit_input_pixels = Some(100);
        config.input.sequential_read = true;
        let lumen = Lumen::new(config);

        let p = lumen.open("in.png").unwrap();
        assert_eq!(p.descriptor().limit_input_pixels(), 100);
        assert!(p.descriptor().sequential_read());
        assert_eq!(lumen.stream().descriptor().limit_input_pixels(), 100);
    }

    #[tokio::test]
    async fn test_stream_end_to_end() {
        let lumen = Lumen::new(Config::default());
        let pipeline = lumen.stream();
        let clones: Vec<Pipeline> = (0..3).map(|_| pipeline.clone()).collect();
        let pending: Vec<_> = clones.iter().map(|c| tokio::spawn(c.metadata())).collect();

        let data = png(5, 3);
        for chunk in data.chunks(7) {
            pipeline.write(chunk.to_vec()).await.unwrap();
        }
        pipeline.complete().unwrap();

        for handle in pending {
            let meta = handle.await.unwrap().unwrap();
            assert_eq!(meta.format, "png");
            assert_eq!((meta.width, meta.height), (5, 3));
            assert!(meta.has_alpha);
        }
    }

    #[tokio::test]
    async fn test_pixel_limit_enforced_by_engine() {
        let lumen = Lumen::new(Config::default());
        let mut p = lumen.open(png(10, 10)).unwrap();
        p.limit_input_pixels(50i64).unwrap();

        let err = p.metadata().await.unwrap_err();
        assert_eq!(
            err,
            EngineError::PixelLimitExceeded {
                width: 10,
                height: 10,
                limit: 50
            }
        );

        p.limit_input_pixels(false).unwrap();
        assert!(p.metadata().await.is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_bytes_rejected() {
        let lumen = Lumen::new(Config::default());
        let p = lumen.open(b"definitely not an image".to_vec()).unwrap();
        assert!(matches!(
            p.metadata().await,
            Err(EngineError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_convert_via_operations() {
        let lumen = Lumen::new(Config::default());
        let mut p = lumen.open(png(4, 4)).unwrap();
        p.set_operation("format", json!("bmp"));
        let out = p.to_buffer().await.unwrap();
        assert_eq!(&out[..2], b"BM");
    }

    #[tokio::test]
    async fn test_raw_input_metadata() {
        let lumen = Lumen::new(Config::default());
        let options = InputOptions::raw(4, 2, 3);
        let p = lumen.open_with(vec![0u8; 24], Some(&options)).unwrap();
        let meta = p.metadata().await.unwrap();
        assert_eq!(meta.format, "raw");
        assert_eq!((meta.width, meta.height, meta.channels), (4, 2, 3));
    }
}
