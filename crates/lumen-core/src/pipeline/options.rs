//! Chainable option setters.

use serde_json::Value;

use crate::error::{InputError, InputResult};

use super::{Operations, Pipeline};

/// Argument to [`Pipeline::limit_input_pixels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLimit {
    /// Explicit pixel count; 0 disables the check
    Pixels(u64),
    /// A negative count, rejected by the setter
    Negative(i64),
    /// The configured maximum
    Default,
    /// No limit at all
    Unlimited,
}

impl From<bool> for PixelLimit {
    fn from(enabled: bool) -> Self {
        if enabled {
            PixelLimit::Default
        } else {
            PixelLimit::Unlimited
        }
    }
}

impl From<i64> for PixelLimit {
    fn from(pixels: i64) -> Self {
        match u64::try_from(pixels) {
            Ok(pixels) => PixelLimit::Pixels(pixels),
            Err(_) => PixelLimit::Negative(pixels),
        }
    }
}

impl From<u64> for PixelLimit {
    fn from(pixels: u64) -> Self {
        PixelLimit::Pixels(pixels)
    }
}

impl Pipeline {
    /// Cap the number of pixels (width x height) the engine will decode.
    ///
    /// `true` restores the configured maximum, `false` or `0` removes the
    /// cap. Negative counts are rejected and leave the limit unchanged.
    pub fn limit_input_pixels(&mut self, limit: impl Into<PixelLimit>) -> InputResult<&mut Self> {
        let pixels = match limit.into() {
            PixelLimit::Default => self.max_pixels,
            PixelLimit::Unlimited => 0,
            PixelLimit::Pixels(n) => n,
            PixelLimit::Negative(n) => {
                return Err(InputError::InvalidPixelLimit {
                    max_pixels: self.max_pixels,
                    received: format!("integer {n}"),
                })
            }
        };
        self.descriptor.limit_input_pixels = pixels;
        Ok(self)
    }

    /// Ask the engine to read the input top to bottom. `None` means `true`.
    pub fn sequential_read(&mut self, enabled: impl Into<Option<bool>>) -> &mut Self {
        self.descriptor.sequential_read = enabled.into().unwrap_or(true);
        self
    }

    /// Set an opaque operation for the engine, replacing any previous value.
    pub fn set_operation(&mut self, name: impl Into<String>, params: Value) -> &mut Self {
        self.operations.insert(name, params);
        self
    }

    pub fn operation(&self, name: &str) -> Option<&Value> {
        self.operations.get(name)
    }

    pub fn remove_operation(&mut self, name: &str) -> Option<Value> {
        self.operations.remove(name)
    }

    pub fn operations(&self) -> &Operations {
        &self.operations
    }
}
