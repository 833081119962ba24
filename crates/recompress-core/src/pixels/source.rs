//! Decoding a source image file into a [`PixelBuffer`].
//!
//! The browser path gets its pixels from a canvas; natively the same contract
//! is met by decoding the file bytes and applying the EXIF orientation, so the
//! buffer has the dimensions the image is displayed at.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use tracing::debug;

use super::{DecodeError, Orientation, PixelBuffer};

/// Anything that can produce a canonical RGBA buffer.
pub trait PixelSource {
    fn decode_to_pixel_buffer(&self) -> Result<PixelBuffer, DecodeError>;
}

/// An encoded image file (JPEG or PNG) held in memory.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    bytes: Vec<u8>,
}

impl ImageFileSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl PixelSource for ImageFileSource {
    fn decode_to_pixel_buffer(&self) -> Result<PixelBuffer, DecodeError> {
        decode_to_pixel_buffer(&self.bytes)
    }
}

/// Decode image file bytes to RGBA, applying EXIF orientation correction.
///
/// # Arguments
///
/// * `bytes` - Raw image file bytes
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized.
/// Returns `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_to_pixel_buffer(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = apply_orientation(img, orientation);
    debug!(
        width = oriented.width(),
        height = oriented.height(),
        ?orientation,
        "decoded source image"
    );

    PixelBuffer::from_rgba_image(oriented.into_rgba8())
}

/// Extract EXIF orientation value from image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}

fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
