//! Pixel source adapter.
//!
//! Everything upstream of the encoder deals in one canonical form: a
//! [`PixelBuffer`] of interleaved RGBA samples. This module defines that type
//! and the adapter that produces it from an encoded image file.
//!
//! # Examples
//!
//! ```ignore
//! use recompress_core::pixels::decode_to_pixel_buffer;
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let buffer = decode_to_pixel_buffer(&bytes).unwrap();
//! println!("Decoded {}x{} image", buffer.width(), buffer.height());
//! ```

mod source;
mod types;

pub use source::{decode_to_pixel_buffer, get_orientation, ImageFileSource, PixelSource};
pub use types::{check_dimensions, expected_len, DecodeError, Orientation, PixelBuffer, BYTES_PER_PIXEL};
