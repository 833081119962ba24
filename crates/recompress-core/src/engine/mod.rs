//! Encoder engines.
//!
//! The engine is the opaque capability that turns RGBA pixels into JPEG bytes.
//! The rest of the pipeline only sees the [`EncoderEngine`] trait; engines are
//! created lazily through an [`EngineLoader`] inside the worker that owns them.
//!
//! Two implementations ship with the crate:
//! - [`ImageJpegEngine`] - pure Rust, built on the `image` crate's encoder
//! - `MozJpegEngine` - mozjpeg bindings, behind the `mozjpeg` cargo feature
//!
//! Engines are the final arbiter of what input they accept. Callers are
//! expected to send well-formed buffers, but every engine runs
//! [`validate_input`] and reports violations as [`EncodeError::InvalidInput`].

mod convert;
mod image_jpeg;
#[cfg(feature = "mozjpeg")]
mod moz;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::error::EncodeError;
use crate::options::EncodeOptions;
use crate::pixels::check_dimensions;

pub use convert::{rgba_to_luma, rgba_to_rgb};
pub use image_jpeg::{ImageJpegEngine, ImageJpegLoader};
#[cfg(feature = "mozjpeg")]
pub use moz::{MozJpegEngine, MozJpegLoader};

/// Highest predefined quantization table index.
pub const MAX_QUANT_TABLE: u8 = 8;

/// A loaded JPEG encoder.
pub trait EncoderEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Compress RGBA pixels into a complete JPEG byte stream.
    fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Creates an engine on first use.
///
/// Loading may be expensive (fetching a codec, probing CPU features), which
/// is why workers defer it until the first request and then cache the result.
pub trait EngineLoader: Send + Sync {
    fn load(&self) -> Result<Box<dyn EncoderEngine>, EncodeError>;
}

impl<F> EngineLoader for F
where
    F: Fn() -> Result<Box<dyn EncoderEngine>, EncodeError> + Send + Sync,
{
    fn load(&self) -> Result<Box<dyn EncoderEngine>, EncodeError> {
        self()
    }
}

/// The loader for the engine this build prefers.
pub fn default_loader() -> Arc<dyn EngineLoader> {
    #[cfg(feature = "mozjpeg")]
    {
        Arc::new(MozJpegLoader)
    }
    #[cfg(not(feature = "mozjpeg"))]
    {
        Arc::new(ImageJpegLoader)
    }
}

/// Check pixel data against the dimensions and options against their ranges.
pub fn validate_input(
    pixels: &[u8],
    width: u32,
    height: u32,
    options: &EncodeOptions,
) -> Result<(), EncodeError> {
    check_dimensions(pixels.len(), width, height)?;

    if !(1..=100).contains(&options.quality) {
        return Err(EncodeError::InvalidInput(format!(
            "quality {} is outside 1-100",
            options.quality
        )));
    }
    if options.separate_chroma_quality && !(1..=100).contains(&options.chroma_quality) {
        return Err(EncodeError::InvalidInput(format!(
            "chroma quality {} is outside 1-100",
            options.chroma_quality
        )));
    }
    if options.smoothing > 100 {
        return Err(EncodeError::InvalidInput(format!(
            "smoothing {} is outside 0-100",
            options.smoothing
        )));
    }
    if options.quant_table > MAX_QUANT_TABLE {
        return Err(EncodeError::InvalidInput(format!(
            "quantization table {} does not exist (0-{MAX_QUANT_TABLE})",
            options.quant_table
        )));
    }
    if options.trellis_loops == 0 {
        return Err(EncodeError::InvalidInput(
            "trellis_loops must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_defaults() {
        let pixels = vec![0u8; 4 * 4 * 4];
        assert!(validate_input(&pixels, 4, 4, &EncodeOptions::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_short_buffer() {
        let pixels = vec![0u8; 2 * 2 * 4 - 1];
        let result = validate_input(&pixels, 2, 2, &EncodeOptions::default());
        assert!(matches!(result, Err(EncodeError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        let result = validate_input(&[], 0, 10, &EncodeOptions::default());
        assert!(matches!(result, Err(EncodeError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_dimensions_too_large_to_address() {
        let result = validate_input(&[], u32::MAX, u32::MAX, &EncodeOptions::default());
        assert!(matches!(result, Err(EncodeError::InvalidInput(_))));

        // Must be rejected before reaching the encoder, which asserts on length
        let result = ImageJpegEngine::new().encode(&[], u32::MAX, u32::MAX, &EncodeOptions::default());
        assert!(matches!(result, Err(EncodeError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_option_ranges() {
        let pixels = vec![0u8; 4];

        let mut opts = EncodeOptions::default();
        opts.quality = 0;
        assert!(validate_input(&pixels, 1, 1, &opts).is_err());

        let mut opts = EncodeOptions::default();
        opts.smoothing = 101;
        assert!(validate_input(&pixels, 1, 1, &opts).is_err());

        let mut opts = EncodeOptions::default();
        opts.quant_table = 9;
        assert!(validate_input(&pixels, 1, 1, &opts).is_err());

        let mut opts = EncodeOptions::default();
        opts.trellis_loops = 0;
        assert!(validate_input(&pixels, 1, 1, &opts).is_err());
    }

    #[test]
    fn test_chroma_quality_only_checked_when_separate() {
        let pixels = vec![0u8; 4];
        let mut opts = EncodeOptions::default();
        opts.chroma_quality = 0;
        assert!(validate_input(&pixels, 1, 1, &opts).is_ok());

        opts.separate_chroma_quality = true;
        assert!(validate_input(&pixels, 1, 1, &opts).is_err());
    }

    #[test]
    fn test_closure_loader() {
        let loader = || -> Result<Box<dyn EncoderEngine>, EncodeError> {
            Ok(Box::new(ImageJpegEngine::new()))
        };
        let engine = loader.load().unwrap();
        assert_eq!(engine.name(), "image-jpeg");
    }

    #[test]
    fn test_default_loader_produces_working_engine() {
        let engine = default_loader().load().unwrap();
        let jpeg = engine
            .encode(&[128u8; 8 * 8 * 4], 8, 8, &EncodeOptions::default())
            .unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }
}
