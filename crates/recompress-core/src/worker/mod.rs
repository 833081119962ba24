//! The encode worker.
//!
//! The worker keeps CPU-bound compression off the caller's thread. It owns
//! the encoder engine (loaded on first use, kept until the worker goes away)
//! and answers every request with exactly one [`WorkerResponse`]: engine
//! errors, load failures and even engine panics all end up as `ERROR`
//! messages, and a failed request leaves the worker ready for the next one.
//!
//! Natively the worker is a dedicated thread ([`EncodeWorker`]); in the
//! browser the Web Worker global plays that role and drives
//! [`process_request`] directly.
//!
//! # State
//!
//! ```text
//! Idle --first request--> Loading --ok--> Ready <--> Encoding
//!                            |
//!                            +--failed--> Idle (retried on next request)
//! ```

mod engine_cell;
mod thread;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::error::EncodeError;
use crate::protocol::{EncodeRequest, WorkerResponse};

pub use engine_cell::EngineCell;
pub use thread::EncodeWorker;

/// Run one encode request to completion.
///
/// Input is not re-validated here; the engine is the final arbiter.
pub fn process_request(engine: &EngineCell, request: EncodeRequest) -> WorkerResponse {
    let EncodeRequest {
        id,
        pixels,
        width,
        height,
        options,
    } = request;

    let result = engine.get().and_then(|engine| {
        catch_unwind(AssertUnwindSafe(|| engine.encode(&pixels, width, height, &options)))
            .unwrap_or_else(|panic| Err(EncodeError::EncodeFailure(panic_message(panic.as_ref()))))
    });

    match &result {
        Ok(bytes) => debug!(%id, width, height, size = bytes.len(), "encode finished"),
        Err(err) => warn!(%id, width, height, error = %err, "encode failed"),
    }

    WorkerResponse::from_result(id, result)
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "encoder panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{gray_pixels, CountingLoader, PANIC_WIDTH};
    use crate::error::ErrorKind;
    use crate::options::EncodeOptions;
    use crate::protocol::RequestId;
    use std::sync::Arc;

    fn request(id: u64, pixels: Vec<u8>, width: u32, height: u32) -> EncodeRequest {
        EncodeRequest {
            id: RequestId(id),
            pixels,
            width,
            height,
            options: EncodeOptions::default(),
        }
    }

    #[test]
    fn test_process_valid_request() {
        let cell = EngineCell::new(Arc::new(CountingLoader::new()));

        match process_request(&cell, request(1, gray_pixels(2, 2), 2, 2)) {
            WorkerResponse::Done { id, bytes } => {
                assert_eq!(id, RequestId(1));
                assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
            }
            other => panic!("Expected DONE, got: {:?}", other),
        }
    }

    #[test]
    fn test_short_buffer_then_valid_request() {
        let cell = EngineCell::new(Arc::new(CountingLoader::new()));

        let mut short = gray_pixels(2, 2);
        short.pop();
        let response = process_request(&cell, request(1, short, 2, 2));
        assert!(matches!(
            response,
            WorkerResponse::Error { kind: ErrorKind::InvalidInput, .. }
        ));

        let response = process_request(&cell, request(2, gray_pixels(2, 2), 2, 2));
        assert!(matches!(response, WorkerResponse::Done { .. }));
    }

    #[test]
    fn test_engine_panic_becomes_encode_failure() {
        let cell = EngineCell::new(Arc::new(CountingLoader::new()));

        let response = process_request(&cell, request(1, gray_pixels(PANIC_WIDTH, 1), PANIC_WIDTH, 1));
        match response {
            WorkerResponse::Error { id, kind, message } => {
                assert_eq!(id, RequestId(1));
                assert_eq!(kind, ErrorKind::EncodeFailure);
                assert_eq!(message, "scripted engine exploded");
            }
            other => panic!("Expected ERROR, got: {:?}", other),
        }

        // The engine is still usable afterwards
        let response = process_request(&cell, request(2, gray_pixels(4, 4), 4, 4));
        assert!(matches!(response, WorkerResponse::Done { .. }));
    }

    #[test]
    fn test_load_failure_reported_then_retried() {
        let loader = CountingLoader::failing_first(1);
        let cell = EngineCell::new(Arc::new(loader.clone()));

        let response = process_request(&cell, request(1, gray_pixels(1, 1), 1, 1));
        assert!(matches!(
            response,
            WorkerResponse::Error { kind: ErrorKind::EngineLoad, .. }
        ));

        let response = process_request(&cell, request(2, gray_pixels(1, 1), 1, 1));
        assert!(matches!(response, WorkerResponse::Done { .. }));
        assert_eq!(loader.loads(), 2);
    }

    #[test]
    fn test_panic_message_payloads() {
        let text: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(panic_message(text.as_ref()), "static text");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned text"));
        assert_eq!(panic_message(owned.as_ref()), "owned text");

        let other: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(other.as_ref()), "encoder panicked");
    }
}
