//! Direct encoding WASM bindings.
//!
//! These run the build's default engine (mozjpeg with the `mozjpeg` feature)
//! synchronously on the calling thread. Inside a Web
//! Worker that is fine; on the page's main thread prefer the message-based
//! [`EncodeWorkerHost`](crate::EncodeWorkerHost).
//!
//! # Example
//!
//! ```typescript
//! import { encode_jpeg } from '@recompress/wasm';
//!
//! const { data, width, height } = ctx.getImageData(0, 0, w, h);
//! const jpeg = encode_jpeg(new Uint8Array(data.buffer), width, height, { quality: 80 });
//! ```

use crate::options::overrides_from_js;
use crate::types::JsPixelBuffer;
use recompress_core::engine::default_loader;
use recompress_core::options::{EncodeOptions, OptionsOverride};
use wasm_bindgen::prelude::*;

/// Encode RGBA pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `options` - Partial encoder options; missing fields use the defaults
///
/// # Errors
///
/// Throws if the pixel length does not match the dimensions, an option is out
/// of range, or the encoder fails.
#[wasm_bindgen]
pub fn encode_jpeg(pixels: &[u8], width: u32, height: u32, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let overrides = overrides_from_js(options)?;
    encode_rgba(pixels, width, height, &overrides).map_err(|e| JsValue::from_str(&e))
}

/// Encode a JsPixelBuffer to JPEG bytes, consuming the buffer.
#[wasm_bindgen]
pub fn encode_pixel_buffer(buffer: JsPixelBuffer, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let overrides = overrides_from_js(options)?;
    let (pixels, width, height) = buffer.into_buffer().into_parts();
    encode_rgba(&pixels, width, height, &overrides).map_err(|e| JsValue::from_str(&e))
}

fn encode_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    overrides: &OptionsOverride,
) -> Result<Vec<u8>, String> {
    let options = EncodeOptions::default().merge(overrides);
    default_loader()
        .load()
        .and_then(|engine| engine.encode(pixels, width, height, &options))
        .map_err(|e| e.to_string())
}


/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_encode_jpeg_basic() {
        let pixels = vec![128u8; 100 * 100 * 4];
        let jpeg = encode_jpeg(&pixels, 100, 100, JsValue::UNDEFINED).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[wasm_bindgen_test]
    fn test_encode_jpeg_invalid_dimensions() {
        let result = encode_jpeg(&[128u8; 100], 0, 100, JsValue::UNDEFINED);
        assert!(result.is_err());
    }

    #[wasm_bindgen_test]
    fn test_encode_pixel_buffer() {
        let buffer = JsPixelBuffer::new(50, 50, vec![128u8; 50 * 50 * 4]).unwrap();
        let jpeg = encode_pixel_buffer(buffer, JsValue::NULL).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }
}
