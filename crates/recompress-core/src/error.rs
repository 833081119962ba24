//! Error taxonomy for the encode pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while submitting or running an encode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The encoder engine could not be initialized.
    ///
    /// A failed load is not cached; the next request retries it.
    #[error("Encoder engine failed to load: {0}")]
    EngineLoad(String),

    /// Pixel data does not match the declared dimensions, or an option is
    /// out of range / unsupported by the engine.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The engine failed while compressing.
    #[error("Encoding failed: {0}")]
    EncodeFailure(String),

    /// The worker was terminated or never started before a response arrived.
    #[error("Worker channel error: {0}")]
    Channel(String),
}

impl EncodeError {
    /// The wire-level kind for this error, or `None` for channel errors,
    /// which cannot travel over the channel they describe.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            EncodeError::EngineLoad(_) => Some(ErrorKind::EngineLoad),
            EncodeError::InvalidInput(_) => Some(ErrorKind::InvalidInput),
            EncodeError::EncodeFailure(_) => Some(ErrorKind::EncodeFailure),
            EncodeError::Channel(_) => None,
        }
    }

    /// Rebuild an error from its wire representation.
    pub fn from_wire(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::EngineLoad => EncodeError::EngineLoad(message),
            ErrorKind::InvalidInput => EncodeError::InvalidInput(message),
            ErrorKind::EncodeFailure => EncodeError::EncodeFailure(message),
        }
    }

    /// The bare description, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            EncodeError::EngineLoad(m)
            | EncodeError::InvalidInput(m)
            | EncodeError::EncodeFailure(m)
            | EncodeError::Channel(m) => m,
        }
    }
}

/// Error classification carried in `ERROR` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    EngineLoad,
    InvalidInput,
    EncodeFailure,
}
