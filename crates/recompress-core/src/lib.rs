//! Recompress Core - off-thread JPEG recompression
//!
//! This crate takes raw RGBA pixels, recompresses them as JPEG with a
//! configurable set of encoder options, and keeps the CPU-bound work off the
//! caller's thread.
//!
//! # Module Structure
//!
//! - `options` - Complete encoder option record, partial overrides, merge
//! - `pixels` - Canonical RGBA buffer and the adapter that decodes source files
//! - `engine` - Encoder engine trait and its implementations
//! - `protocol` - Request/response messages crossing the worker boundary
//! - `worker` - Encode worker owning the lazily loaded engine
//! - `session` - Async request/response API over one worker
//!
//! # Data Flow
//!
//! ```text
//! PixelSource -> PixelBuffer -> EncodeSession --ENCODE--> EncodeWorker -> EncoderEngine
//!                                     ^                        |
//!                                     +------DONE / ERROR------+
//! ```

pub mod engine;
pub mod error;
pub mod options;
pub mod pixels;
pub mod protocol;
pub mod session;
pub mod worker;

pub use engine::{default_loader, EncoderEngine, EngineLoader, ImageJpegEngine};
pub use error::{EncodeError, ErrorKind};
pub use options::{ChromaSubsample, ColorSpace, EncodeOptions, OptionsOverride};
pub use pixels::{decode_to_pixel_buffer, DecodeError, PixelBuffer, PixelSource};
pub use protocol::{EncodeRequest, RequestId, WorkerRequest, WorkerResponse};
pub use session::{EncodeSession, SessionConfig};
pub use worker::{process_request, EncodeWorker, EngineCell};
