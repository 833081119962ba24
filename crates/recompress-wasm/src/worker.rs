//! Web Worker message host.
//!
//! A worker script owns one [`EncodeWorkerHost`] and forwards every incoming
//! message to it. The host loads the engine on the first `ENCODE` and keeps it
//! for the rest of the worker's life.
//!
//! # Messages
//!
//! ```text
//! in:  { type: "ENCODE", id?, payload: { pixelBuffer, width, height, options? } }
//! out: { type: "DONE",  id, payload: Uint8Array }
//!      { type: "ERROR", id, kind, payload: string }
//! ```
//!
//! `pixelBuffer` may be a `Uint8Array`, `Uint8ClampedArray` or `ArrayBuffer`.
//! The older `{ type: "ENCODE_JPEG", payload: { imageData, opts } }` shape,
//! with `imageData` being a canvas `ImageData`, is accepted as well. Any other `type` yields `undefined` and no reply should be posted.
//!
//! # Example
//!
//! ```typescript
//! import init, { EncodeWorkerHost } from '@recompress/wasm';
//!
//! await init();
//! const host = new EncodeWorkerHost();
//! self.onmessage = (e) => {
//!   const reply = host.handle_message(e.data);
//!   if (reply) self.postMessage(reply, reply.type === 'DONE' ? [reply.payload.buffer] : []);
//! };
//! ```

use crate::options::overrides_from_js;
use js_sys::{ArrayBuffer, Object, Reflect, Uint8Array, Uint8ClampedArray};
use recompress_core::engine::default_loader;
use recompress_core::options::EncodeOptions;
use recompress_core::protocol::{EncodeRequest, RequestId, WorkerResponse};
use recompress_core::worker::{process_request, EngineCell};
use recompress_core::ErrorKind;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const ENCODE: &str = "ENCODE";
const LEGACY_ENCODE: &str = "ENCODE_JPEG";

/// Encoder state living inside one Web Worker.
#[wasm_bindgen]
pub struct EncodeWorkerHost {
    engine: EngineCell,
    base_options: EncodeOptions,
}

#[wasm_bindgen]
impl EncodeWorkerHost {
    /// Create a host. The engine is not loaded until the first `ENCODE`.
    #[wasm_bindgen(constructor)]
    pub fn new() -> EncodeWorkerHost {
        EncodeWorkerHost {
            engine: EngineCell::new(default_loader()),
            base_options: EncodeOptions::default(),
        }
    }

    /// Whether the engine has finished loading.
    #[wasm_bindgen(getter)]
    pub fn engine_loaded(&self) -> bool {
        self.engine.is_loaded()
    }

    /// Handle one incoming message and return the reply to post.
    ///
    /// Returns `undefined` for messages this host does not understand.
    /// Encode failures are reported as `ERROR` replies, never thrown.
    pub fn handle_message(&self, message: JsValue) -> Result<JsValue, JsValue> {
        let command = get(&message, "type").and_then(|v| v.as_string());
        let legacy = match command.as_deref() {
            Some(ENCODE) => false,
            Some(LEGACY_ENCODE) => true,
            _ => return Ok(JsValue::UNDEFINED),
        };

        let id = read_id(&message);
        let parsed = if legacy {
            self.parse_legacy(&message, id)
        } else {
            self.parse_payload(&message, id)
        };

        let response = match parsed {
            Ok(request) => process_request(&self.engine, request),
            Err(message) => WorkerResponse::Error {
                id,
                kind: ErrorKind::InvalidInput,
                message,
            },
        };

        if let WorkerResponse::Error { id, message, .. } = &response {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "recompress: request {id} failed: {message}"
            )));
        }

        response_to_js(response)
    }
}

impl Default for EncodeWorkerHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeWorkerHost {
    fn parse_payload(&self, message: &JsValue, id: RequestId) -> Result<EncodeRequest, String> {
        let payload = get(message, "payload")
            .filter(|p| p.is_object())
            .ok_or_else(|| "ENCODE message has no payload".to_string())?;

        let pixels = get(&payload, "pixelBuffer")
            .filter(|v| !v.is_undefined())
            .or_else(|| get(&payload, "pixels"))
            .ok_or_else(|| "payload has no pixelBuffer".to_string())?;

        self.build_request(
            id,
            &pixels,
            get(&payload, "width"),
            get(&payload, "height"),
            get(&payload, "options").unwrap_or(JsValue::UNDEFINED),
        )
    }

    fn parse_legacy(&self, message: &JsValue, id: RequestId) -> Result<EncodeRequest, String> {
        let payload = get(message, "payload")
            .filter(|p| p.is_object())
            .ok_or_else(|| "ENCODE_JPEG message has no payload".to_string())?;
        let image = get(&payload, "imageData")
            .filter(|v| v.is_object())
            .ok_or_else(|| "ENCODE_JPEG payload has no imageData".to_string())?;
        let pixels = get(&image, "data").ok_or_else(|| "imageData has no data".to_string())?;

        self.build_request(
            id,
            &pixels,
            get(&image, "width"),
            get(&image, "height"),
            get(&payload, "opts").unwrap_or(JsValue::UNDEFINED),
        )
    }

    fn build_request(
        &self,
        id: RequestId,
        pixels: &JsValue,
        width: Option<JsValue>,
        height: Option<JsValue>,
        options: JsValue,
    ) -> Result<EncodeRequest, String> {
        let width = dimension("width", width.and_then(|v| v.as_f64()))?;
        let height = dimension("height", height.and_then(|v| v.as_f64()))?;
        let overrides = overrides_from_js(options).map_err(|e| {
            e.as_string()
                .unwrap_or_else(|| "Invalid encoder options".to_string())
        })?;

        Ok(EncodeRequest {
            id,
            pixels: bytes_from_js(pixels)?,
            width,
            height,
            options: self.base_options.merge(&overrides),
        })
    }
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    if !target.is_object() {
        return None;
    }
    Reflect::get(target, &JsValue::from_str(key)).ok()
}

fn read_id(message: &JsValue) -> RequestId {
    let id = get(message, "id")
        .filter(|v| !v.is_undefined())
        .or_else(|| get(message, "payload").and_then(|p| get(&p, "id")))
        .and_then(|v| v.as_f64());
    RequestId(id.and_then(id_from_f64).unwrap_or(0))
}

fn bytes_from_js(value: &JsValue) -> Result<Vec<u8>, String> {
    if let Some(array) = value.dyn_ref::<Uint8Array>() {
        Ok(array.to_vec())
    } else if let Some(array) = value.dyn_ref::<Uint8ClampedArray>() {
        Ok(array.to_vec())
    } else if let Some(buffer) = value.dyn_ref::<ArrayBuffer>() {
        Ok(Uint8Array::new(buffer).to_vec())
    } else {
        Err("pixelBuffer must be a Uint8Array, Uint8ClampedArray or ArrayBuffer".to_string())
    }
}

fn response_to_js(response: WorkerResponse) -> Result<JsValue, JsValue> {
    let reply = Object::new();
    let id = JsValue::from_f64(response.id().0 as f64);
    Reflect::set(&reply, &"id".into(), &id)?;

    match response {
        WorkerResponse::Done { bytes, .. } => {
            Reflect::set(&reply, &"type".into(), &"DONE".into())?;
            let payload = Uint8Array::from(bytes.as_slice());
            Reflect::set(&reply, &"payload".into(), &payload)?;
        }
        WorkerResponse::Error { kind, message, .. } => {
            Reflect::set(&reply, &"type".into(), &"ERROR".into())?;
            Reflect::set(&reply, &"kind".into(), &kind_name(kind).into())?;
            Reflect::set(&reply, &"payload".into(), &message.into())?;
        }
    }

    Ok(reply.into())
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::EngineLoad => "ENGINE_LOAD",
        ErrorKind::InvalidInput => "INVALID_INPUT",
        ErrorKind::EncodeFailure => "ENCODE_FAILURE",
    }
}

/// Whole, non-negative numbers within `u32` range.
fn dimension(name: &str, value: Option<f64>) -> Result<u32, String> {
    match value {
        Some(v) if v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) => Ok(v as u32),
        Some(v) => Err(format!("{name} must be a whole number, got {v}")),
        None => Err(format!("payload has no numeric {name}")),
    }
}

fn id_from_f64(value: f64) -> Option<u64> {
    (value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64).then_some(value as u64)
}


/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn encode_message(width: u32, height: u32, len: usize) -> JsValue {
        let payload = Object::new();
        let pixels = Uint8Array::from(vec![128u8; len].as_slice());
        Reflect::set(&payload, &"pixelBuffer".into(), &pixels).unwrap();
        Reflect::set(&payload, &"width".into(), &JsValue::from(width)).unwrap();
        Reflect::set(&payload, &"height".into(), &JsValue::from(height)).unwrap();

        let message = Object::new();
        Reflect::set(&message, &"type".into(), &"ENCODE".into()).unwrap();
        Reflect::set(&message, &"id".into(), &JsValue::from(9)).unwrap();
        Reflect::set(&message, &"payload".into(), &payload).unwrap();
        message.into()
    }

    fn field(value: &JsValue, key: &str) -> JsValue {
        Reflect::get(value, &key.into()).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_encode_message_replies_done() {
        let host = EncodeWorkerHost::new();
        assert!(!host.engine_loaded());

        let reply = host.handle_message(encode_message(8, 8, 8 * 8 * 4)).unwrap();
        assert_eq!(field(&reply, "type").as_string().as_deref(), Some("DONE"));
        assert_eq!(field(&reply, "id").as_f64(), Some(9.0));

        let bytes = Uint8Array::new(&field(&reply, "payload")).to_vec();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        assert!(host.engine_loaded());
    }

    #[wasm_bindgen_test]
    fn test_short_buffer_replies_error() {
        let host = EncodeWorkerHost::new();
        let reply = host.handle_message(encode_message(8, 8, 10)).unwrap();
        assert_eq!(field(&reply, "type").as_string().as_deref(), Some("ERROR"));
        assert_eq!(field(&reply, "kind").as_string().as_deref(), Some("INVALID_INPUT"));
        assert!(field(&reply, "payload").as_string().is_some());
    }

    #[wasm_bindgen_test]
    fn test_legacy_encode_jpeg_message() {
        let image_data = Object::new();
        let data = Uint8ClampedArray::new_with_length(6 * 4 * 4);
        data.copy_from(&[200u8; 6 * 4 * 4]);
        Reflect::set(&image_data, &"data".into(), &data).unwrap();
        Reflect::set(&image_data, &"width".into(), &JsValue::from(6)).unwrap();
        Reflect::set(&image_data, &"height".into(), &JsValue::from(4)).unwrap();

        let opts = Object::new();
        Reflect::set(&opts, &"quality".into(), &JsValue::from(40)).unwrap();
        Reflect::set(&opts, &"progressive".into(), &JsValue::TRUE).unwrap();

        let payload = Object::new();
        Reflect::set(&payload, &"imageData".into(), &image_data).unwrap();
        Reflect::set(&payload, &"opts".into(), &opts).unwrap();

        let message = Object::new();
        Reflect::set(&message, &"type".into(), &"ENCODE_JPEG".into()).unwrap();
        Reflect::set(&message, &"payload".into(), &payload).unwrap();

        let host = EncodeWorkerHost::new();
        let reply = host.handle_message(message.into()).unwrap();
        assert_eq!(field(&reply, "type").as_string().as_deref(), Some("DONE"));
        let bytes = Uint8Array::new(&field(&reply, "payload")).to_vec();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }

    #[wasm_bindgen_test]
    fn test_legacy_message_without_image_data_is_error() {
        let message = Object::new();
        Reflect::set(&message, &"type".into(), &"ENCODE_JPEG".into()).unwrap();
        Reflect::set(&message, &"payload".into(), &Object::new()).unwrap();

        let reply = EncodeWorkerHost::new().handle_message(message.into()).unwrap();
        assert_eq!(field(&reply, "kind").as_string().as_deref(), Some("INVALID_INPUT"));
    }

    #[wasm_bindgen_test]
    fn test_unknown_type_is_ignored() {
        let host = EncodeWorkerHost::new();
        let message = Object::new();
        Reflect::set(&message, &"type".into(), &"PING".into()).unwrap();

        assert!(host.handle_message(message.into()).unwrap().is_undefined());
        assert!(host.handle_message(JsValue::from_f64(3.0)).unwrap().is_undefined());
    }
}
