//! Lazily loaded, cached encoder engine.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use super::panic_message;
use crate::engine::{EncoderEngine, EngineLoader};
use crate::error::EncodeError;

/// Holds the engine for the lifetime of a worker.
///
/// The first [`get`](EngineCell::get) loads the engine while holding the slot
/// lock, so concurrent callers wait for that one load and share its result.
/// A failed load leaves the slot empty; the next call tries again instead of
/// replaying the old failure.
pub struct EngineCell {
    loader: Arc<dyn EngineLoader>,
    slot: Mutex<Option<Arc<dyn EncoderEngine>>>,
    load_attempts: AtomicUsize,
}

impl EngineCell {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(None),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Return the cached engine, loading it first if needed.
    pub fn get(&self) -> Result<Arc<dyn EncoderEngine>, EncodeError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let attempt = self.load_attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let loaded = catch_unwind(AssertUnwindSafe(|| self.loader.load())).unwrap_or_else(|panic| {
            Err(EncodeError::EngineLoad(panic_message(panic.as_ref())))
        });

        match loaded {
            Ok(engine) => {
                let engine: Arc<dyn EncoderEngine> = Arc::from(engine);
                info!(engine = engine.name(), attempt, "encoder engine loaded");
                *slot = Some(Arc::clone(&engine));
                Ok(engine)
            }
            Err(err) => {
                warn!(attempt, error = %err, "encoder engine failed to load");
                Err(match err {
                    EncodeError::EngineLoad(_) => err,
                    other => EncodeError::EngineLoad(other.to_string()),
                })
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// How many times the loader has been invoked.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::Relaxed)
    }
}
