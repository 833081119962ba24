//! Encoder options model.
//!
//! [`EncodeOptions`] is the complete record handed to an encoder engine. Callers
//! usually only care about a handful of fields, so requests carry an
//! [`OptionsOverride`] that is merged onto a complete base record before it
//! crosses the worker boundary. The engine therefore never sees a missing field.
//!
//! No cross-field validation happens here: combinations such as
//! `arithmetic && progressive` pass through untouched and the engine decides
//! whether it accepts them.

use serde::{Deserialize, Serialize};

/// Output color space of the JPEG.
///
/// Serialized as the numeric code used by the browser UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ColorSpace {
    /// Single luma channel.
    Grayscale = 1,
    /// Untransformed RGB components.
    Rgb = 2,
    /// Standard JPEG luma/chroma.
    #[default]
    YCbCr = 3,
}

impl TryFrom<u8> for ColorSpace {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ColorSpace::Grayscale),
            2 => Ok(ColorSpace::Rgb),
            3 => Ok(ColorSpace::YCbCr),
            other => Err(format!("unknown color space code {other}")),
        }
    }
}

impl From<ColorSpace> for u8 {
    fn from(value: ColorSpace) -> Self {
        value as u8
    }
}

/// Chroma subsampling mode.
///
/// The browser UI sends a square sampling factor from 1 to 4, applied to
/// both axes. Codes 1 and 2 keep that meaning (1 = no subsampling, 2 = both
/// axes halved). Code 3 is reassigned to 4:2:2, the only other layout
/// decoders reliably support; factors 3 and 4 (3x3 and 4x4 chroma blocks)
/// are not offered and code 4 is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ChromaSubsample {
    /// 4:4:4, full resolution chroma.
    S444 = 1,
    /// 4:2:0, chroma halved horizontally and vertically.
    #[default]
    S420 = 2,
    /// 4:2:2, chroma halved horizontally.
    S422 = 3,
}

impl ChromaSubsample {
    /// Chroma block size in pixels as `(horizontal, vertical)`.
    pub fn pixel_sizes(self) -> (u8, u8) {
        match self {
            ChromaSubsample::S444 => (1, 1),
            ChromaSubsample::S420 => (2, 2),
            ChromaSubsample::S422 => (2, 1),
        }
    }
}

impl TryFrom<u8> for ChromaSubsample {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ChromaSubsample::S444),
            2 => Ok(ChromaSubsample::S420),
            3 => Ok(ChromaSubsample::S422),
            other => Err(format!("unknown chroma subsampling code {other}")),
        }
    }
}

impl From<ChromaSubsample> for u8 {
    fn from(value: ChromaSubsample) -> Self {
        value as u8
    }
}

/// Complete set of encoder tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// JPEG quality (1-100). The UI exposes 10-95.
    pub quality: u8,
    /// Force a baseline (sequential) JPEG.
    pub baseline: bool,
    /// Use arithmetic entropy coding instead of Huffman.
    pub arithmetic: bool,
    /// Emit a multi-scan progressive JPEG.
    pub progressive: bool,
    /// Compute optimal Huffman tables.
    pub optimize_coding: bool,
    /// Pre-filter smoothing strength (0-100).
    pub smoothing: u8,
    /// Output color space.
    pub color_space: ColorSpace,
    /// Predefined quantization table variant (0-8).
    pub quant_table: u8,
    pub trellis_multipass: bool,
    pub trellis_opt_zero: bool,
    pub trellis_opt_table: bool,
    /// Trellis refinement passes (at least 1).
    pub trellis_loops: u32,
    /// Let the engine pick chroma subsampling; `chroma_subsample` is then advisory.
    pub auto_subsample: bool,
    pub chroma_subsample: ChromaSubsample,
    /// Use `chroma_quality` for the chroma planes.
    pub separate_chroma_quality: bool,
    /// Chroma quality (1-100), only read when `separate_chroma_quality` is set.
    pub chroma_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            quality: 75,
            baseline: false,
            arithmetic: false,
            progressive: true,
            optimize_coding: true,
            smoothing: 0,
            color_space: ColorSpace::YCbCr,
            quant_table: 3,
            trellis_multipass: false,
            trellis_opt_zero: false,
            trellis_opt_table: false,
            trellis_loops: 1,
            auto_subsample: true,
            chroma_subsample: ChromaSubsample::S420,
            separate_chroma_quality: false,
            chroma_quality: 75,
        }
    }
}

impl EncodeOptions {
    /// Create the default option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of `self` with every field present in `overrides` replaced.
    pub fn merge(&self, overrides: &OptionsOverride) -> EncodeOptions {
        EncodeOptions {
            quality: overrides.quality.unwrap_or(self.quality),
            baseline: overrides.baseline.unwrap_or(self.baseline),
            arithmetic: overrides.arithmetic.unwrap_or(self.arithmetic),
            progressive: overrides.progressive.unwrap_or(self.progressive),
            optimize_coding: overrides.optimize_coding.unwrap_or(self.optimize_coding),
            smoothing: overrides.smoothing.unwrap_or(self.smoothing),
            color_space: overrides.color_space.unwrap_or(self.color_space),
            quant_table: overrides.quant_table.unwrap_or(self.quant_table),
            trellis_multipass: overrides.trellis_multipass.unwrap_or(self.trellis_multipass),
            trellis_opt_zero: overrides.trellis_opt_zero.unwrap_or(self.trellis_opt_zero),
            trellis_opt_table: overrides.trellis_opt_table.unwrap_or(self.trellis_opt_table),
            trellis_loops: overrides.trellis_loops.unwrap_or(self.trellis_loops),
            auto_subsample: overrides.auto_subsample.unwrap_or(self.auto_subsample),
            chroma_subsample: overrides.chroma_subsample.unwrap_or(self.chroma_subsample),
            separate_chroma_quality: overrides
                .separate_chroma_quality
                .unwrap_or(self.separate_chroma_quality),
            chroma_quality: overrides.chroma_quality.unwrap_or(self.chroma_quality),
        }
    }
}

/// Partial option set supplied per request.
///
/// Unrecognized fields are ignored when deserializing so that older and newer
/// option sets can talk to each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arithmetic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progressive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize_coding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_space: Option<ColorSpace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quant_table: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trellis_multipass: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trellis_opt_zero: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trellis_opt_table: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trellis_loops: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_subsample: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chroma_subsample: Option<ChromaSubsample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate_chroma_quality: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chroma_quality: Option<u8>,
}

impl OptionsOverride {
    /// An override that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override only the quality.
    pub fn quality(quality: u8) -> Self {
        Self {
            quality: Some(quality),
            ..Self::default()
        }
    }

    /// Check if no field is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
