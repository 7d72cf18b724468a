//! The artist-facing primary grade and its validation at the JSON boundary.
//!
//! Two payload shapes reach this module. The live bridge sends keyed
//! channels (`{"r": .., "g": .., "b": ..}`) while exported blueprint files
//! store positional triples (`[r, g, b]`). Both normalize into [`Rgb`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GradeError;

/// Default contrast. 1.0 leaves the grade unmodified.
pub const DEFAULT_CONTRAST: f64 = 1.0;
/// Default contrast pivot.
pub const DEFAULT_PIVOT: f64 = 0.435;
/// Default saturation. 1.0 = neutral.
pub const DEFAULT_SATURATION: f64 = 1.0;

/// A per-channel triple in fixed `r, g, b` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn splat(v: f64) -> Self {
        Self { r: v, g: v, b: v }
    }

    pub const fn to_array(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// Apply `f` to each channel, preserving channel order.
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Read a channel triple from either `{"r","g","b"}` or `[r, g, b]`.
    ///
    /// Malformed content is a computation error; the caller has already
    /// established that the field itself is present.
    fn from_value(field: &str, value: &Value) -> Result<Self, GradeError> {
        match value {
            Value::Object(map) => {
                let channel = |key: &str| {
                    map.get(key)
                        .ok_or_else(|| {
                            GradeError::Computation(format!("{field}: missing channel '{key}'"))
                        })
                        .and_then(|v| number(&format!("{field}.{key}"), v))
                };
                Ok(Self::new(channel("r")?, channel("g")?, channel("b")?))
            }
            Value::Array(items) if items.len() == 3 => Ok(Self::new(
                number(&format!("{field}[0]"), &items[0])?,
                number(&format!("{field}[1]"), &items[1])?,
                number(&format!("{field}[2]"), &items[2])?,
            )),
            Value::Array(items) => Err(GradeError::Computation(format!(
                "{field}: expected 3 channels, got {}",
                items.len()
            ))),
            other => Err(GradeError::Computation(format!(
                "{field}: expected an r/g/b object or a 3-element array, got {}",
                type_name(other)
            ))),
        }
    }
}

/// Primary-wheel grade as authored by the artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeDescriptor {
    /// Additive shadow offset.
    pub lift: Rgb,
    /// Per-channel midtone power exponent.
    pub gamma: Rgb,
    /// Multiplicative highlight scale.
    pub gain: Rgb,
    /// Contrast multiplier. 0.0 pulls everything to the pivot.
    pub contrast: f64,
    /// Contrast anchor.
    pub pivot: f64,
    /// Saturation multiplier.
    pub saturation: f64,
}

impl Default for GradeDescriptor {
    /// Identity grade.
    fn default() -> Self {
        Self {
            lift: Rgb::splat(0.0),
            gamma: Rgb::splat(1.0),
            gain: Rgb::splat(1.0),
            contrast: DEFAULT_CONTRAST,
            pivot: DEFAULT_PIVOT,
            saturation: DEFAULT_SATURATION,
        }
    }
}

impl GradeDescriptor {
    /// Extract the grade from a full request payload (`{"primary": {...}, ...}`).
    pub fn from_payload(payload: &Value) -> Result<Self, GradeError> {
        let primary = payload
            .get("primary")
            .filter(|p| !p.is_null())
            .ok_or_else(|| {
                GradeError::Validation("Invalid payload. Missing 'primary' parameters.".into())
            })?;
        Self::from_primary(primary)
    }

    /// Extract the grade from the `primary` object itself.
    pub fn from_primary(primary: &Value) -> Result<Self, GradeError> {
        let Value::Object(map) = primary else {
            return Err(GradeError::Validation(format!(
                "Invalid payload. 'primary' must be an object, got {}",
                type_name(primary)
            )));
        };

        let required = |field: &str| {
            map.get(field)
                .filter(|v| !v.is_null())
                .ok_or_else(|| {
                    GradeError::Validation(format!(
                        "Invalid payload. Missing 'primary.{field}' parameter."
                    ))
                })
        };
        // Presence is checked for all three before any channel is parsed so
        // a missing field always wins over a malformed neighbour.
        let (lift, gamma, gain) = (required("lift")?, required("gamma")?, required("gain")?);

        let optional = |field: &str, default: f64| match map.get(field) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => number(field, v),
        };

        Ok(Self {
            lift: Rgb::from_value("lift", lift)?,
            gamma: Rgb::from_value("gamma", gamma)?,
            gain: Rgb::from_value("gain", gain)?,
            contrast: optional("contrast", DEFAULT_CONTRAST)?,
            pivot: optional("pivot", DEFAULT_PIVOT)?,
            saturation: optional("saturation", DEFAULT_SATURATION)?,
        })
    }
}

fn number(field: &str, value: &Value) -> Result<f64, GradeError> {
    value.as_f64().ok_or_else(|| {
        GradeError::Computation(format!(
            "{field}: expected a number, got {}",
            type_name(value)
        ))
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
