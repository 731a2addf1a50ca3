//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Largest width or height accepted for raw pixel input.
pub const MAX_DIMENSION: u32 = 0x3FFF;

/// Default pixel limit (`0x3FFF * 0x3FFF`).
pub const MAX_PIXELS: u64 = (MAX_DIMENSION as u64) * (MAX_DIMENSION as u64);

/// Resource limits applied when building descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum raw pixel width
    pub max_width: u32,

    /// Maximum raw pixel height
    pub max_height: u32,

    /// Pixel count stored by `limit_input_pixels(true)`
    pub max_pixels: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_width: MAX_DIMENSION,
            max_height: MAX_DIMENSION,
            max_pixels: MAX_PIXELS,
        }
    }
}

/// Defaults applied to every newly opened pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Advise the engine to read sequentially
    pub sequential_read: bool,

    /// Initial pixel limit; `None` falls back to `limits.max_pixels`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_input_pixels: Option<u64>,

    /// Read size used when piping a reader into a stream pipeline
    pub chunk_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            sequential_read: false,
            limit_input_pixels: None,
            chunk_size: 64 * 1024,
        }
    }
}

/// Native engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-call timeout for header inspection and re-encode, in milliseconds
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
