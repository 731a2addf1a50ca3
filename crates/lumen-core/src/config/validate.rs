//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, MAX_DIMENSION};

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("max_width", self.limits.max_width),
            ("max_height", self.limits.max_height),
        ] {
            if !(1..=MAX_DIMENSION).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "limits.{name} must be between 1 and {MAX_DIMENSION}, got {value}"
                )));
            }
        }
        if self.input.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "input.chunk_size must be > 0".into(),
            ));
        }
        if self.engine.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "engine.timeout_ms must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }
        Ok(())
    }
}
