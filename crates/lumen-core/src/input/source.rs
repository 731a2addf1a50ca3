//! Incrementally delivered input shared by a group of pipelines.
//!
//! A [`SharedSource`] collects frames in arrival order and flattens them into
//! one contiguous buffer exactly once. Its state lives in a
//! [`tokio::sync::watch`] channel which acts as a durable latch: once the
//! state is `Flattened` it never changes again, and a waiter that subscribes
//! late still sees it on its first check.

use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::InputError;

/// One unit of incremental delivery.
///
/// Mirrors the two frame kinds of message-oriented transports. Only binary
/// frames carry image bytes; text frames are rejected by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Binary(Bytes),
    Text(String),
}

impl Frame {
    pub(crate) fn describe(&self) -> String {
        match self {
            Frame::Binary(b) => format!("binary frame of {} bytes", b.len()),
            Frame::Text(t) => format!("text frame of {} chars", t.chars().count()),
        }
    }
}

impl From<Bytes> for Frame {
    fn from(bytes: Bytes) -> Self {
        Frame::Binary(bytes)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Frame::Binary(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Frame {
    fn from(bytes: &'static [u8]) -> Self {
        Frame::Binary(Bytes::from_static(bytes))
    }
}

impl<const N: usize> From<&'static [u8; N]> for Frame {
    fn from(bytes: &'static [u8; N]) -> Self {
        Frame::Binary(Bytes::from_static(bytes))
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Frame::Text(text)
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Frame::Text(text.to_string())
    }
}

/// Where a pipeline's input is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Stream input with nothing delivered yet
    Open,
    /// Stream input with at least one frame delivered
    Accumulating,
    /// Input bytes (or path) fully available
    Finalized,
}

#[derive(Debug)]
enum SourceState {
    Pending { chunks: Vec<Bytes>, len: usize },
    Flattened(Bytes),
}

impl SourceState {
    fn flattened(&self) -> Option<Bytes> {
        match self {
            SourceState::Flattened(bytes) => Some(bytes.clone()),
            SourceState::Pending { .. } => None,
        }
    }
}

/// Handle to one incremental source. Cloning the handle joins the sharing group.
#[derive(Debug, Clone)]
pub struct SharedSource {
    state: Arc<watch::Sender<SourceState>>,
}

impl Default for SharedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedSource {
    /// A new, empty source in the `Open` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SourceState::Pending {
            chunks: Vec::new(),
            len: 0,
        });
        Self {
            state: Arc::new(tx),
        }
    }

    /// Append a frame.
    ///
    /// Fails with [`InputError::UnexpectedData`] once the source has been
    /// flattened, and with [`InputError::NonByteChunk`] for text frames.
    pub fn accept(&self, frame: Frame) -> Result<(), InputError> {
        let mut outcome = Ok(());
        // Appending never wakes waiters; only flattening does.
        self.state.send_if_modified(|state| {
            outcome = match state {
                SourceState::Flattened(_) => Err(InputError::UnexpectedData {
                    reason: format!("{} after stream input completed", frame.describe()),
                }),
                SourceState::Pending { chunks, len } => match frame {
                    Frame::Binary(bytes) => {
                        *len += bytes.len();
                        chunks.push(bytes);
                        Ok(())
                    }
                    text @ Frame::Text(_) => Err(InputError::NonByteChunk {
                        received: text.describe(),
                    }),
                },
            };
            false
        });
        outcome
    }

    /// Flatten pending chunks and release every waiter.
    ///
    /// Idempotent: later calls return the same buffer without re-concatenating.
    pub fn complete(&self) -> Bytes {
        let mut flattened = Bytes::new();
        let fired = self.state.send_if_modified(|state| {
            let bytes = match state {
                SourceState::Flattened(bytes) => {
                    flattened = bytes.clone();
                    return false;
                }
                SourceState::Pending { chunks, len } => flatten(std::mem::take(chunks), *len),
            };
            flattened = bytes.clone();
            *state = SourceState::Flattened(bytes);
            true
        });
        if fired {
            tracing::debug!(
                bytes = flattened.len(),
                handles = self.handles(),
                "Stream input completed"
            );
        }
        flattened
    }

    /// The flattened bytes, if completion has happened.
    pub fn flattened(&self) -> Option<Bytes> {
        self.state.borrow().flattened()
    }

    /// Current lifecycle state of the sharing group.
    pub fn lifecycle(&self) -> Lifecycle {
        match &*self.state.borrow() {
            SourceState::Flattened(_) => Lifecycle::Finalized,
            SourceState::Pending { chunks, .. } if chunks.is_empty() => Lifecycle::Open,
            SourceState::Pending { .. } => Lifecycle::Accumulating,
        }
    }

    /// Number of chunks accepted so far (zero once flattened).
    pub fn pending_chunks(&self) -> usize {
        match &*self.state.borrow() {
            SourceState::Pending { chunks, .. } => chunks.len(),
            SourceState::Flattened(_) => 0,
        }
    }

    /// Whether two handles belong to the same sharing group.
    pub fn same_group(&self, other: &SharedSource) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Number of live handles on the sharing group's state.
    ///
    /// Counts every pipeline in the group plus every pending
    /// [`wait`](Self::wait) future, since each of those holds a handle too.
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.state)
    }

    /// Resolve with the flattened bytes once the source completes.
    ///
    /// Resolves immediately if completion already happened. Never resolves
    /// if nobody calls [`complete`](Self::complete).
    pub fn wait(&self) -> impl std::future::Future<Output = Bytes> + Send + 'static {
        let state = Arc::clone(&self.state);
        async move {
            let mut rx = state.subscribe();
            // `state` keeps the sender alive, so the channel cannot close here.
            let flattened = rx
                .wait_for(|s| matches!(s, SourceState::Flattened(_)))
                .await
                .ok()
                .and_then(|s| s.flattened());
            flattened.unwrap_or_default()
        }
    }
}

/// Concatenate in arrival order. A single chunk is passed through untouched.
fn flatten(mut chunks: Vec<Bytes>, len: usize) -> Bytes {
    if chunks.len() == 1 {
        return chunks.pop().unwrap_or_default();
    }
    let mut buf = BytesMut::with_capacity(len);
    for chunk in &chunks {
        buf.extend_from_slice(chunk);
    }
    buf.freeze()
}
