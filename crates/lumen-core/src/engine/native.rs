//! Engine backed by the `image` and `kamadak-exif` crates.

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::{FinishedInput, ResolvedSource};
use crate::pipeline::Operations;
use crate::types::ImageMetadata;

use super::{inspect, render, ImageEngine};

/// Built-in engine: header inspection and straight re-encoding, with a
/// per-call timeout.
pub struct NativeEngine {
    config: EngineConfig,
}

impl NativeEngine {
    /// Create a new engine with the given settings.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Read the input's bytes. Buffers are shared, files are read once.
    async fn load(&self, input: &FinishedInput) -> Result<Bytes, EngineError> {
        match &input.source {
            ResolvedSource::Buffer(bytes) => Ok(bytes.clone()),
            ResolvedSource::File(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| EngineError::Io {
                    path: path.clone(),
                    message: e.to_string(),
                }),
        }
    }

    /// Run CPU-bound work on the blocking pool under the configured timeout.
    async fn run_blocking<T, F>(&self, stage: &str, work: F) -> Result<T, EngineError>
    where
        F: FnOnce() -> Result<T, EngineError> + Send + 'static,
        T: Send + 'static,
    {
        let timeout_ms = self.config.timeout_ms;
        match timeout(
            Duration::from_millis(timeout_ms),
            tokio::task::spawn_blocking(work),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(EngineError::Other(format!("Task join error: {}", e))),
            Err(_) => Err(EngineError::Timeout {
                stage: stage.to_string(),
                timeout_ms,
            }),
        }
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[async_trait]
impl ImageEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    async fn metadata(&self, input: &FinishedInput) -> Result<ImageMetadata, EngineError> {
        if input.sequential_read {
            tracing::trace!("Sequential read requested; whole-buffer inspection ignores it");
        }
        let bytes = self.load(input).await?;
        let input = input.clone();
        self.run_blocking("metadata", move || inspect::inspect(&bytes, &input))
            .await
    }

    async fn render(
        &self,
        input: &FinishedInput,
        operations: &Operations,
    ) -> Result<Bytes, EngineError> {
        let target = target_format(operations)?;
        let bytes = self.load(input).await?;
        let input = input.clone();
        self.run_blocking("render", move || render::render(&bytes, &input, target))
            .await
            .map(Bytes::from)
    }
}

/// The `format` operation, if set: an extension such as `"png"` or `"jpg"`.
fn target_format(operations: &Operations) -> Result<Option<ImageFormat>, EngineError> {
    match operations.get("format") {
        None => Ok(None),
        Some(Value::String(name)) => ImageFormat::from_extension(name)
            .map(Some)
            .ok_or_else(|| EngineError::UnsupportedFormat {
                detail: Some(format!("output format {name:?}")),
            }),
        Some(other) => Err(EngineError::Other(format!(
            "format operation expects a string, got {other}"
        ))),
    }
}
