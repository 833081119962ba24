//! Pure Rust engine backed by the `image` crate's JPEG encoder.
//!
//! The encoder produces baseline JPEGs with standard Huffman tables. Of the
//! option set it honors `quality` and `color_space` (grayscale output); the
//! remaining tunables are accepted and have no effect. Arithmetic coding is
//! rejected because this encoder cannot produce it.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;
use tracing::debug;

use super::convert::{rgba_to_luma, rgba_to_rgb};
use super::{validate_input, EncoderEngine, EngineLoader};
use crate::error::EncodeError;
use crate::options::{ColorSpace, EncodeOptions};

/// JPEG encoder built on `image::codecs::jpeg`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageJpegEngine;

impl ImageJpegEngine {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderEngine for ImageJpegEngine {
    fn name(&self) -> &'static str {
        "image-jpeg"
    }

    fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EncodeError> {
        validate_input(pixels, width, height, options)?;

        if options.arithmetic {
            return Err(EncodeError::InvalidInput(
                "arithmetic coding is not supported by the image-jpeg engine".to_string(),
            ));
        }

        let (samples, color_type) = match options.color_space {
            ColorSpace::Grayscale => (rgba_to_luma(pixels), ExtendedColorType::L8),
            ColorSpace::Rgb | ColorSpace::YCbCr => (rgba_to_rgb(pixels), ExtendedColorType::Rgb8),
        };

        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, options.quality);
        encoder
            .write_image(&samples, width, height, color_type)
            .map_err(|e| EncodeError::EncodeFailure(e.to_string()))?;

        let bytes = buffer.into_inner();
        debug!(width, height, quality = options.quality, size = bytes.len(), "image-jpeg encode");
        Ok(bytes)
    }
}

/// Loader for [`ImageJpegEngine`]. Loading cannot fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageJpegLoader;

impl EngineLoader for ImageJpegLoader {
    fn load(&self) -> Result<Box<dyn EncoderEngine>, EncodeError> {
        Ok(Box::new(ImageJpegEngine::new()))
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
