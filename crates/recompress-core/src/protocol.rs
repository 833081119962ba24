//! Messages exchanged across the worker boundary.
//!
//! Both directions use an adjacently tagged shape, `{ type, payload }`, so the
//! same types describe the in-process channel and the browser `postMessage`
//! traffic. Every request carries a [`RequestId`] that the worker echoes back,
//! which lets the session match responses to callers without relying on
//! arrival order.

use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, ErrorKind};
use crate::options::EncodeOptions;

/// Correlation id tagging a request and its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One encode job. The pixel storage moves with the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeRequest {
    pub id: RequestId,
    /// Interleaved RGBA samples, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Always a complete record; overrides are merged before sending.
    pub options: EncodeOptions,
}

/// Caller → worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WorkerRequest {
    #[serde(rename = "ENCODE")]
    Encode(EncodeRequest),
}

/// Worker → caller. Exactly one is sent per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WorkerResponse {
    /// Complete JPEG byte stream.
    #[serde(rename = "DONE")]
    Done { id: RequestId, bytes: Vec<u8> },
    /// Human-readable failure description plus its classification.
    #[serde(rename = "ERROR")]
    Error {
        id: RequestId,
        kind: ErrorKind,
        message: String,
    },
}

impl WorkerResponse {
    /// Build the response for an engine outcome.
    pub fn from_result(id: RequestId, result: Result<Vec<u8>, EncodeError>) -> Self {
        match result {
            Ok(bytes) => WorkerResponse::Done { id, bytes },
            Err(err) => WorkerResponse::Error {
                id,
                // Channel errors originate on the caller side; if one ever
                // reaches the worker it is reported as an encode failure.
                kind: err.kind().unwrap_or(ErrorKind::EncodeFailure),
                message: err.message().to_string(),
            },
        }
    }

    pub fn id(&self) -> RequestId {
        match self {
            WorkerResponse::Done { id, .. } | WorkerResponse::Error { id, .. } => *id,
        }
    }

    /// Convert back into the caller-facing result.
    pub fn into_result(self) -> Result<Vec<u8>, EncodeError> {
        match self {
            WorkerResponse::Done { bytes, .. } => Ok(bytes),
            WorkerResponse::Error { kind, message, .. } => Err(EncodeError::from_wire(kind, message)),
        }
    }
}
