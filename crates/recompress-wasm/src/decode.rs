//! Source image decoding WASM bindings.
//!
//! Browsers normally hand pixels over from a canvas. These bindings cover the
//! case where only the file bytes are at hand, e.g. inside a worker without
//! `OffscreenCanvas`.
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, encode_pixel_buffer } from '@recompress/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const buffer = decode_image(bytes);
//! const jpeg = encode_pixel_buffer(buffer, { quality: 60 });
//! ```

use crate::types::JsPixelBuffer;
use recompress_core::pixels;
use wasm_bindgen::prelude::*;

/// Decode JPEG or PNG file bytes into an RGBA pixel buffer.
///
/// EXIF orientation is applied, so the buffer has the displayed dimensions.
///
/// # Errors
///
/// Throws if the format is not recognized or the file is corrupted.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsPixelBuffer, JsValue> {
    pixels::decode_to_pixel_buffer(bytes)
        .map(JsPixelBuffer::from_buffer)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Read the EXIF orientation tag (1-8). Returns 1 when there is none.
#[wasm_bindgen]
pub fn get_orientation(bytes: &[u8]) -> u8 {
    pixels::get_orientation(bytes) as u8
}
