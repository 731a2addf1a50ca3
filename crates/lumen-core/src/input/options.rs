//! Caller-supplied input options, typed and untyped.
//!
//! [`InputOptions`] is what the descriptor builder consumes. Callers holding
//! loosely typed parameters (JSON bodies, scripting bridges) go through
//! [`InputOptions::from_value`], which performs the shape checks before any
//! range validation happens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InputError;

/// Optional parameters describing how to interpret the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputOptions {
    /// Pixels-per-inch hint for vector formats (1 to 2400)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<i64>,

    /// Dimensions for uninterpreted raw pixel input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawOptions>,
}

/// Raw pixel dimensions as supplied; completeness is checked by the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOptions {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub channels: Option<i64>,
}

impl InputOptions {
    /// Options with only a density hint.
    pub fn with_density(density: i64) -> Self {
        Self {
            density: Some(density),
            raw: None,
        }
    }

    /// Options describing a raw pixel buffer.
    pub fn raw(width: i64, height: i64, channels: i64) -> Self {
        Self {
            density: None,
            raw: Some(RawOptions {
                width: Some(width),
                height: Some(height),
                channels: Some(channels),
            }),
        }
    }

    /// Parse options from an untyped value.
    ///
    /// `null` is treated as "no options". Anything else that is not an object
    /// fails with [`InputError::InvalidInputOptions`].
    pub fn from_value(value: &Value) -> Result<Option<Self>, InputError> {
        let map = match value {
            Value::Null => return Ok(None),
            Value::Object(map) => map,
            other => {
                return Err(InputError::InvalidInputOptions {
                    received: describe(other),
                })
            }
        };

        let density = match defined(map, "density") {
            None => None,
            Some(v) => Some(as_integer(v).ok_or_else(|| InputError::InvalidDensity {
                received: describe(v),
            })?),
        };

        let raw = match defined(map, "raw") {
            None => None,
            Some(Value::Object(raw)) => Some(RawOptions {
                width: raw_field(raw, "width")?,
                height: raw_field(raw, "height")?,
                channels: raw_field(raw, "channels")?,
            }),
            Some(other) => {
                return Err(InputError::InvalidRawSpec {
                    problem: format!("raw must be an object, got {}", describe(other)),
                })
            }
        };

        Ok(Some(Self { density, raw }))
    }
}

fn raw_field(raw: &Map<String, Value>, name: &str) -> Result<Option<i64>, InputError> {
    match defined(raw, name) {
        None => Ok(None),
        Some(v) => as_integer(v).map(Some).ok_or_else(|| InputError::InvalidRawSpec {
            problem: format!("{name} must be an integer, got {}", describe(v)),
        }),
    }
}

/// Look up a key, treating an explicit `null` as absent.
fn defined<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

/// Integral numbers only; `72.0` counts, `72.5` and `"72"` do not.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Category plus value, for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(a) => format!("array of {} items", a.len()),
        Value::Object(_) => "object".to_string(),
    }
}
