//! Error types for Lumen pipelines.
//!
//! Validation failures ([`InputError`]) are raised at the call that triggered
//! them. Engine failures ([`EngineError`]) only ever arrive through the
//! asynchronous metadata and render paths, relayed untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Lumen operations.
#[derive(Error, Debug)]
pub enum LumenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input descriptor, sink or option-setter contract violations
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Failures reported by the processing engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// General I/O errors (e.g. while piping a reader into a pipeline)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Local validation and contract violations on inputs, frames and options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The input is neither a usable path, a buffer, nor an allowed stream
    #[error("Unsupported input: expected a non-empty file path, a byte buffer or a stream, got {received}")]
    UnsupportedInput { received: String },

    /// Density is not an integer within range
    #[error("Invalid density: expected an integer between 1 and 2400, got {received}")]
    InvalidDensity { received: String },

    /// Raw pixel specification is incomplete or out of range
    #[error("Expected width, height and channels for raw pixel input: {problem}")]
    InvalidRawSpec { problem: String },

    /// Input options are present but are not a structured object
    #[error("Invalid input options: expected an object, got {received}")]
    InvalidInputOptions { received: String },

    /// Data was written to a pipeline that is not accepting frames
    #[error("Unexpected data: {reason}")]
    UnexpectedData { reason: String },

    /// A frame that does not carry bytes was written to a stream source
    #[error("Non-byte frame on stream input: got {received}")]
    NonByteChunk { received: String },

    /// Pixel limit is negative
    #[error("Invalid pixel limit: expected 0 to {max_pixels}, true or false, got {received}")]
    InvalidPixelLimit { max_pixels: u64, received: String },
}

/// Errors surfaced by an [`ImageEngine`](crate::engine::ImageEngine).
///
/// `Clone` so the same failure can be handed to several observers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The input file could not be read
    #[error("Cannot read {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// The bytes are not in any format the engine recognises
    #[error("Input buffer contains unsupported image format{}", detail_suffix(.detail))]
    UnsupportedFormat { detail: Option<String> },

    /// Header parsing failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Pixel count exceeds the configured limit
    #[error("Input image exceeds pixel limit ({width}x{height} > {limit})")]
    PixelLimitExceeded { width: u32, height: u32, limit: u64 },

    /// Raw pixel buffer length disagrees with its declared dimensions
    #[error("Raw pixel buffer is {actual} bytes, expected {expected} ({width}x{height}x{channels})")]
    RawLength {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        channels: u8,
    },

    /// The engine did not answer in time
    #[error("Timeout in {stage} after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// Output encoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Anything else an engine wants to report
    #[error("{0}")]
    Other(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Convenience type alias for Lumen results.
pub type Result<T> = std::result::Result<T, LumenError>;

/// Convenience type alias for input-validation results.
pub type InputResult<T> = std::result::Result<T, InputError>;
