//! Recompress WASM - WebAssembly bindings for Recompress
//!
//! This crate exposes recompress-core to JavaScript/TypeScript so JPEG
//! recompression can run inside a Web Worker instead of on the page's main
//! thread.
//!
//! # Module Structure
//!
//! - `worker` - Message host driving the `ENCODE` / `DONE` / `ERROR` protocol
//! - `encode` - Direct, synchronous encoding bindings
//! - `decode` - Source file decoding (JPEG, PNG) to RGBA
//! - `options` - Default options and partial-override merging
//! - `types` - WASM-compatible pixel buffer wrapper
//!
//! # Usage
//!
//! ```typescript
//! // encoder.worker.ts
//! import init, { EncodeWorkerHost } from '@recompress/wasm';
//!
//! await init();
//! const host = new EncodeWorkerHost();
//! self.onmessage = (e) => {
//!   const reply = host.handle_message(e.data);
//!   if (reply) self.postMessage(reply);
//! };
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod encode;
mod options;
mod types;
mod worker;

// Re-export public types
pub use decode::{decode_image, get_orientation};
pub use encode::{encode_jpeg, encode_pixel_buffer};
pub use options::{default_options, merge_options};
pub use types::JsPixelBuffer;
pub use worker::EncodeWorkerHost;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Name of the engine a new `EncodeWorkerHost` will load.
#[wasm_bindgen]
pub fn engine_name() -> Result<String, JsValue> {
    recompress_core::default_loader()
        .load()
        .map(|engine| engine.name().to_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
