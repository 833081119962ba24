//! Engine test doubles shared by the worker and session tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{EncoderEngine, EngineLoader, ImageJpegEngine};
use crate::error::EncodeError;
use crate::options::EncodeOptions;

/// Width that makes [`ScriptedEngine`] panic.
pub const PANIC_WIDTH: u32 = 13;
/// Width that makes [`ScriptedEngine`] sleep before encoding.
pub const SLOW_WIDTH: u32 = 7;
pub const SLOW_DELAY: Duration = Duration::from_millis(400);

/// Wraps the real engine, panicking or stalling on magic widths.
pub struct ScriptedEngine;

impl EncoderEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EncodeError> {
        if width == PANIC_WIDTH {
            panic!("scripted engine exploded");
        }
        if width == SLOW_WIDTH {
            thread::sleep(SLOW_DELAY);
        }
        ImageJpegEngine::new().encode(pixels, width, height, options)
    }
}

/// Counts load attempts; fails the first `failures` of them.
#[derive(Clone, Default)]
pub struct CountingLoader {
    loads: Arc<AtomicUsize>,
    failures: usize,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(failures: usize) -> Self {
        Self {
            loads: Arc::default(),
            failures,
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl EngineLoader for CountingLoader {
    fn load(&self) -> Result<Box<dyn EncoderEngine>, EncodeError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(EncodeError::EngineLoad(format!("attempt {attempt} refused")));
        }
        Ok(Box::new(ScriptedEngine))
    }
}

/// `width * height` mid-gray opaque pixels.
pub fn gray_pixels(width: u32, height: u32) -> Vec<u8> {
    [128u8, 128, 128, 255].repeat(width as usize * height as usize)
}
