//! Encoder options WASM bindings.
//!
//! Options cross the boundary as plain JavaScript objects using the same field
//! names and numeric enum codes as the core `EncodeOptions`. Partial objects
//! are accepted anywhere options are; missing fields take the defaults and
//! unknown fields are ignored.
//!
//! # Example
//!
//! ```typescript
//! import { default_options, merge_options } from '@recompress/wasm';
//!
//! const defaults = default_options();        // { quality: 75, progressive: true, ... }
//! const opts = merge_options({ quality: 50 }); // defaults with quality 50
//! ```

use recompress_core::options::{EncodeOptions, OptionsOverride};
use wasm_bindgen::prelude::*;

/// Get the default encoder options as a plain object.
#[wasm_bindgen]
pub fn default_options() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&EncodeOptions::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Merge a partial options object onto the defaults.
///
/// `undefined` or `null` yields the defaults unchanged.
#[wasm_bindgen]
pub fn merge_options(overrides: JsValue) -> Result<JsValue, JsValue> {
    let overrides = overrides_from_js(overrides)?;
    serde_wasm_bindgen::to_value(&EncodeOptions::default().merge(&overrides))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse a JS options object into an override record.
pub(crate) fn overrides_from_js(value: JsValue) -> Result<OptionsOverride, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(OptionsOverride::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid encoder options: {e}")))
}
