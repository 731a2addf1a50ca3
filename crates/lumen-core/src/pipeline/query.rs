//! Deferred queries: metadata and rendering.
//!
//! Both wait for the input to be finalized, then hand a snapshot to the
//! engine. The futures own everything they touch, so they can be spawned or
//! held past the pipeline that created them.

use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;

use crate::error::EngineError;
use crate::types::ImageMetadata;

use super::Pipeline;

impl Pipeline {
    /// Header-level metadata for the input.
    ///
    /// If the input is a stream that has not completed yet, the query waits
    /// for completion before the engine is called. Every call dispatches to
    /// the engine; results are not cached.
    pub fn metadata(
        &self,
    ) -> impl Future<Output = Result<ImageMetadata, EngineError>> + Send + 'static {
        let finished = self.descriptor.finish();
        let engine = Arc::clone(&self.engine);
        async move {
            let input = finished.await;
            tracing::debug!(engine = engine.name(), "Dispatching metadata query");
            let result = engine.metadata(&input).await;
            if let Err(e) = &result {
                tracing::debug!("Metadata query failed: {}", e);
            }
            result
        }
    }

    /// Callback form of [`metadata`](Self::metadata).
    ///
    /// Spawns the query on the current runtime and returns immediately; the
    /// callback runs once with the outcome.
    pub fn metadata_with<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(Result<ImageMetadata, EngineError>) + Send + 'static,
    {
        spawn_with(self.metadata(), callback);
        self
    }

    /// Render the input through the engine using this pipeline's operations.
    ///
    /// The operations are captured when this is called; later changes do
    /// not affect the pending render.
    pub fn to_buffer(&self) -> impl Future<Output = Result<Bytes, EngineError>> + Send + 'static {
        let finished = self.descriptor.finish();
        let engine = Arc::clone(&self.engine);
        let operations = self.operations.clone();
        async move {
            let input = finished.await;
            tracing::debug!(
                engine = engine.name(),
                operations = operations.len(),
                "Dispatching render"
            );
            engine.render(&input, &operations).await
        }
    }

    /// Callback form of [`to_buffer`](Self::to_buffer).
    pub fn to_buffer_with<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(Result<Bytes, EngineError>) + Send + 'static,
    {
        spawn_with(self.to_buffer(), callback);
        self
    }
}

/// Drive `future` in the background and hand its output to `callback`.
///
/// Outside a Tokio runtime a single-threaded one is started on a helper
/// thread.
fn spawn_with<T, Fut, F>(future: Fut, callback: F)
where
    Fut: Future<Output = Result<T, EngineError>> + Send + 'static,
    F: FnOnce(Result<T, EngineError>) + Send + 'static,
    T: Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move { callback(future.await) });
        }
        Err(_) => {
            std::thread::spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => callback(runtime.block_on(future)),
                    Err(e) => callback(Err(EngineError::Other(format!(
                        "Failed to start runtime: {}",
                        e
                    )))),
                }
            });
        }
    }
}
