//! The pipeline object: construction, cloning and the stream sink.

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::Config;
use crate::engine::ImageEngine;
use crate::error::{InputError, InputResult, Result};
use crate::input::{Frame, InputDescriptor, Lifecycle, SourceKind};

use super::Operations;

/// A deferred image pipeline: one input descriptor, a set of operations and
/// the engine that will eventually run them.
///
/// Cloning shares the input (for stream input, the whole sharing group) and
/// copies the operations, so each clone can be configured independently.
pub struct Pipeline {
    pub(super) descriptor: InputDescriptor,
    pub(super) operations: Operations,
    pub(super) engine: Arc<dyn ImageEngine>,
    pub(super) max_pixels: u64,
    chunk_size: usize,
}

impl Pipeline {
    /// Wrap a built descriptor.
    ///
    /// Overrides the descriptor's `sequential_read` and `limit_input_pixels`
    /// with the defaults from `config.input`; use the setters afterwards to
    /// change them.
    pub(crate) fn from_descriptor(
        mut descriptor: InputDescriptor,
        engine: Arc<dyn ImageEngine>,
        config: &Config,
    ) -> Self {
        descriptor.sequential_read = config.input.sequential_read;
        descriptor.limit_input_pixels = config.initial_pixel_limit();
        tracing::debug!(
            kind = ?descriptor.kind(),
            engine = engine.name(),
            "Opened pipeline"
        );
        Self {
            descriptor,
            operations: Operations::default(),
            engine,
            max_pixels: config.limits.max_pixels,
            chunk_size: config.input.chunk_size,
        }
    }

    pub fn descriptor(&self) -> &InputDescriptor {
        &self.descriptor
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.descriptor.lifecycle()
    }

    pub fn is_finalized(&self) -> bool {
        self.lifecycle() == Lifecycle::Finalized
    }

    /// Whether both pipelines read the same input (same path, same buffer
    /// allocation or same sharing group).
    pub fn shares_input_with(&self, other: &Pipeline) -> bool {
        self.descriptor.source().same_identity(other.descriptor.source())
    }

    /// Push one frame of stream input.
    ///
    /// Fails with [`InputError::UnexpectedData`] when the input is not a
    /// stream or has already completed, and [`InputError::NonByteChunk`] for
    /// text frames.
    pub fn accept(&self, frame: impl Into<Frame>) -> InputResult<()> {
        let frame = frame.into();
        let Some(source) = self.descriptor.stream() else {
            return Err(self.not_a_stream(&frame.describe()));
        };
        let len = match &frame {
            Frame::Binary(bytes) => bytes.len(),
            Frame::Text(_) => 0,
        };
        match source.accept(frame) {
            Ok(()) => {
                tracing::trace!(bytes = len, chunks = source.pending_chunks(), "Accepted frame");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Rejected frame: {}", e);
                Err(e)
            }
        }
    }

    /// Writable-sink form of [`accept`](Self::accept) for async producers.
    pub async fn write(&self, frame: impl Into<Frame>) -> InputResult<()> {
        self.accept(frame)
    }

    /// Signal the end of stream input.
    ///
    /// Flattens the accumulated frames once and releases every member of the
    /// sharing group. Repeated calls return the same bytes.
    pub fn complete(&self) -> InputResult<Bytes> {
        match self.descriptor.stream() {
            Some(source) => Ok(source.complete()),
            None => Err(self.not_a_stream("end of input")),
        }
    }

    /// Read `reader` to the end as stream input, then complete.
    pub async fn pipe_from<R>(&self, mut reader: R) -> Result<Bytes>
    where
        R: AsyncRead + Unpin,
    {
        if self.descriptor.stream().is_none() {
            return Err(self.not_a_stream("reader").into());
        }
        let mut buf = BytesMut::with_capacity(self.chunk_size);
        loop {
            buf.reserve(self.chunk_size);
            if reader.read_buf(&mut buf).await? == 0 {
                break;
            }
            self.accept(buf.split().freeze())?;
        }
        Ok(self.complete()?)
    }

    /// Feed every frame of `frames` as stream input, then complete.
    ///
    /// Stops at the first rejected frame without completing.
    pub async fn pipe_from_stream<S>(&self, frames: S) -> InputResult<Bytes>
    where
        S: Stream,
        S::Item: Into<Frame>,
    {
        let mut frames = std::pin::pin!(frames);
        while let Some(frame) = frames.next().await {
            self.accept(frame)?;
        }
        self.complete()
    }

    fn not_a_stream(&self, what: &str) -> InputError {
        let kind = match self.descriptor.kind() {
            SourceKind::FilePath => "a file path",
            SourceKind::ByteSequence => "a buffer",
            SourceKind::IncrementalSource => "a stream",
        };
        InputError::UnexpectedData {
            reason: format!("{what} written to a pipeline whose input is {kind}"),
        }
    }
}

impl Clone for Pipeline {
    fn clone(&self) -> Self {
        let clone = Self {
            descriptor: self.descriptor.clone(),
            operations: self.operations.clone(),
            engine: Arc::clone(&self.engine),
            max_pixels: self.max_pixels,
            chunk_size: self.chunk_size,
        };
        tracing::debug!(
            kind = ?self.descriptor.kind(),
            lifecycle = ?self.lifecycle(),
            handles = self.descriptor.stream().map(|s| s.handles()),
            "Cloned pipeline"
        );
        clone
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("descriptor", &self.descriptor)
            .field("operations", &self.operations)
            .field("engine", &self.engine.name())
            .finish()
    }
}
