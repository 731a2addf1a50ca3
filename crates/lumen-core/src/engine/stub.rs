//! Recording engine for pipeline tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::EngineError;
use crate::input::FinishedInput;
use crate::pipeline::Operations;
use crate::types::ImageMetadata;

use super::ImageEngine;

/// Answers every call with a fixed outcome and records what it was handed.
pub(crate) struct StubEngine {
    outcome: Result<ImageMetadata, EngineError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<FinishedInput>>,
}

impl StubEngine {
    pub(crate) fn ok() -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(sample_metadata()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing(err: EngineError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(err),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<FinishedInput> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, input: &FinishedInput) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(input.clone());
    }
}

pub(crate) fn sample_metadata() -> ImageMetadata {
    ImageMetadata {
        format: "png".to_string(),
        width: 4,
        height: 2,
        space: "srgb".to_string(),
        channels: 3,
        depth: "uchar".to_string(),
        density: None,
        has_profile: false,
        has_alpha: false,
        orientation: None,
        exif: None,
        icc: None,
    }
}

#[async_trait]
impl ImageEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    async fn metadata(&self, input: &FinishedInput) -> Result<ImageMetadata, EngineError> {
        self.record(input);
        self.outcome.clone()
    }

    /// Echoes the operations as JSON so tests can see which map was used.
    async fn render(
        &self,
        input: &FinishedInput,
        operations: &Operations,
    ) -> Result<Bytes, EngineError> {
        self.record(input);
        self.outcome.clone()?;
        serde_json::to_vec(operations)
            .map(Bytes::from)
            .map_err(|e| EngineError::Encode(e.to_string()))
    }
}
