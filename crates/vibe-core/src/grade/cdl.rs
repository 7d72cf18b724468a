//! Contrast baking into an ASC CDL tuple.
//!
//! The host has no contrast primitive on a CDL node, so contrast is folded
//! into slope and offset as a lerp toward the pivot:
//!
//! ```text
//!   slope[c]  = gain[c] × contrast
//!   offset[c] = lift[c] × contrast + pivot × (1 − contrast)
//!   power[c]  = gamma[c]
//! ```
//!
//! Power is never touched by contrast.

use serde::{Deserialize, Serialize};

use crate::grade::descriptor::{GradeDescriptor, Rgb};

/// Slope/Offset/Power/Saturation ready for the host's CDL call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BakedCdl {
    pub slope: Rgb,
    pub offset: Rgb,
    pub power: Rgb,
    pub saturation: f64,
}

/// Bake a primary grade into CDL form.
///
/// No clamping or finiteness checks happen here; see [`BakedCdl::is_finite`].
pub fn bake(grade: &GradeDescriptor) -> BakedCdl {
    let contrast = grade.contrast;
    let pivot_term = grade.pivot * (1.0 - contrast);

    BakedCdl {
        slope: grade.gain.map(|g| g * contrast),
        offset: grade.lift.map(|l| l * contrast + pivot_term),
        power: grade.gamma,
        saturation: grade.saturation,
    }
}

impl BakedCdl {
    pub fn is_finite(&self) -> bool {
        self.slope.is_finite()
            && self.offset.is_finite()
            && self.power.is_finite()
            && self.saturation.is_finite()
    }

    /// The literal parameter map the host's `SetCDL` call expects.
    pub fn to_parameter_map(&self, node_index: u32) -> CdlParameterMap {
        CdlParameterMap {
            node_index: node_index.to_string(),
            slope: format_triple(self.slope),
            offset: format_triple(self.offset),
            power: format_triple(self.power),
            saturation: format_plain_decimal(self.saturation),
        }
    }
}

/// String-valued CDL parameters, keyed the way the host names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdlParameterMap {
    #[serde(rename = "NodeIndex")]
    pub node_index: String,
    #[serde(rename = "Slope")]
    pub slope: String,
    #[serde(rename = "Offset")]
    pub offset: String,
    #[serde(rename = "Power")]
    pub power: String,
    #[serde(rename = "Saturation")]
    pub saturation: String,
}

/// `r g b` with six fixed decimals each.
pub fn format_triple(rgb: Rgb) -> String {
    format!("{:.6} {:.6} {:.6}", rgb.r, rgb.g, rgb.b)
}

/// Shortest round-trip decimal, keeping one decimal place on integral values
/// (`1.0`, not `1`).
pub fn format_plain_decimal(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}
