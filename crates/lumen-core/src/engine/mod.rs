//! The processing engine seam.
//!
//! Pipelines never inspect pixels themselves. Once their input is finished
//! they hand a [`FinishedInput`] to an [`ImageEngine`] and relay whatever it
//! returns, success or failure.

mod inspect;
mod native;
mod render;

#[cfg(test)]
pub(crate) mod stub;

pub use native::NativeEngine;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::EngineError;
use crate::input::FinishedInput;
use crate::pipeline::Operations;
use crate::types::ImageMetadata;

/// Trait that all processing engines implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (pipelines hold an `Arc<dyn ImageEngine>`).
#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Inspect the input without decoding pixel data.
    async fn metadata(&self, input: &FinishedInput) -> Result<ImageMetadata, EngineError>;

    /// Apply `operations` to the input and return the encoded result.
    async fn render(
        &self,
        input: &FinishedInput,
        operations: &Operations,
    ) -> Result<Bytes, EngineError>;
}
