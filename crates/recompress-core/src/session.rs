//! Encode session manager.
//!
//! An [`EncodeSession`] owns one encode worker and turns the message protocol
//! into a plain async call: hand over pixels and option overrides, get JPEG
//! bytes or an [`EncodeError`] back.
//!
//! Each request is tagged with a [`RequestId`]. A router thread reads the
//! worker's responses and completes the matching one-shot channel, so several
//! submissions may be in flight on the same session at once.
//!
//! The protocol has no cancel message. [`EncodeSession::dispose`] drops the
//! worker and fails every pending request with [`EncodeError::Channel`];
//! [`EncodeSession::submit_encode_timeout`] builds timeouts on top of that by
//! recycling the worker when the timer wins.
//!
//! # Example
//!
//! ```ignore
//! use recompress_core::{EncodeSession, OptionsOverride};
//!
//! let mut session = EncodeSession::with_defaults();
//! session.initialize()?;
//! let jpeg = session
//!     .submit_encode(rgba, width, height, &OptionsOverride::quality(60))
//!     .await?;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::engine::{default_loader, EngineLoader};
use crate::error::EncodeError;
use crate::options::{EncodeOptions, OptionsOverride};
use crate::pixels::PixelBuffer;
use crate::protocol::{EncodeRequest, RequestId, WorkerRequest, WorkerResponse};
use crate::worker::EncodeWorker;

/// Session configuration.
///
/// `base_options` is the complete record every request's overrides are
/// merged onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub base_options: EncodeOptions,
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_options: EncodeOptions::default(),
            thread_name: "recompress-encoder".to_string(),
        }
    }
}

type Pending = Arc<Mutex<HashMap<RequestId, oneshot::Sender<WorkerResponse>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Connection {
    worker: EncodeWorker,
    pending: Pending,
}

/// Caller-side owner of one encode worker.
pub struct EncodeSession {
    loader: Arc<dyn EngineLoader>,
    config: SessionConfig,
    connection: Option<Connection>,
    next_id: AtomicU64,
}

impl EncodeSession {
    /// Create a session. No worker runs until [`initialize`](Self::initialize).
    pub fn new(loader: Arc<dyn EngineLoader>, config: SessionConfig) -> Self {
        Self {
            loader,
            config,
            connection: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// A session using this build's preferred engine and default options.
    pub fn with_defaults() -> Self {
        Self::new(default_loader(), SessionConfig::default())
    }

    /// Start the worker. A worker that is already running is disposed first,
    /// so a session never has two.
    pub fn initialize(&mut self) -> Result<(), EncodeError> {
        self.dispose();

        let (worker, responses) = EncodeWorker::spawn(Arc::clone(&self.loader), &self.config.thread_name)?;
        let pending: Pending = Arc::default();

        let router_pending = Arc::clone(&pending);
        let spawned = thread::Builder::new()
            .name(format!("{}-router", self.config.thread_name))
            .spawn(move || route_responses(responses, router_pending));
        if let Err(e) = spawned {
            drop(worker.terminate());
            return Err(EncodeError::Channel(format!("failed to start response router: {e}")));
        }

        info!(thread = %self.config.thread_name, "encode session initialized");
        self.connection = Some(Connection { worker, pending });
        Ok(())
    }

    /// Check if a worker is attached.
    pub fn is_active(&self) -> bool {
        self.connection.is_some()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Encode RGBA pixels. The buffer moves to the worker.
    ///
    /// `overrides` is merged onto the session's base options; the worker always
    /// receives a complete record.
    pub async fn submit_encode(
        &self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        overrides: &OptionsOverride,
    ) -> Result<Vec<u8>, EncodeError> {
        let (id, response) = self.post(pixels, width, height, overrides)?;
        await_response(id, response).await
    }

    /// Encode a validated [`PixelBuffer`].
    pub async fn encode_buffer(
        &self,
        buffer: PixelBuffer,
        overrides: &OptionsOverride,
    ) -> Result<Vec<u8>, EncodeError> {
        let (pixels, width, height) = buffer.into_parts();
        self.submit_encode(pixels, width, height, overrides).await
    }

    /// Like [`submit_encode`](Self::submit_encode), but gives up after
    /// `timeout`. The worker cannot be interrupted, so on timeout the session
    /// is recycled: the stuck worker is disposed (failing anything else in
    /// flight) and a fresh one started.
    pub async fn submit_encode_timeout(
        &mut self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        overrides: &OptionsOverride,
        timeout: Duration,
    ) -> Result<Vec<u8>, EncodeError> {
        let (id, response) = self.post(pixels, width, height, overrides)?;

        match tokio::time::timeout(timeout, await_response(id, response)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%id, ?timeout, "encode timed out, recycling worker");
                self.initialize()?;
                Err(EncodeError::Channel(format!(
                    "request {id} timed out after {timeout:?}"
                )))
            }
        }
    }

    /// Terminate the worker. Pending requests fail with
    /// [`EncodeError::Channel`]. Calling this on an inactive session does nothing.
    pub fn dispose(&mut self) {
        // The thread exits on its own once the current encode finishes
        drop(self.shutdown());
    }

    /// Detach the worker, fail pending requests and close its channel.
    /// Returns the worker thread's handle.
    fn shutdown(&mut self) -> Option<thread::JoinHandle<()>> {
        let connection = self.connection.take()?;
        let abandoned = {
            let mut pending = lock(&connection.pending);
            let count = pending.len();
            pending.clear();
            count
        };
        let handle = connection.worker.terminate();
        info!(abandoned, "encode session disposed");
        Some(handle)
    }

    fn post(
        &self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        overrides: &OptionsOverride,
    ) -> Result<(RequestId, oneshot::Receiver<WorkerResponse>), EncodeError> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| EncodeError::Channel("session is not initialized".to_string()))?;

        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let options = self.config.base_options.merge(overrides);
        let (tx, rx) = oneshot::channel();
        lock(&connection.pending).insert(id, tx);

        let request = WorkerRequest::Encode(EncodeRequest {
            id,
            pixels,
            width,
            height,
            options,
        });
        if let Err(err) = connection.worker.post(request) {
            lock(&connection.pending).remove(&id);
            return Err(err);
        }

        debug!(%id, width, height, "encode request posted");
        Ok((id, rx))
    }
}

impl Drop for EncodeSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn await_response(
    id: RequestId,
    response: oneshot::Receiver<WorkerResponse>,
) -> Result<Vec<u8>, EncodeError> {
    match response.await {
        Ok(response) => response.into_result(),
        Err(_) => Err(EncodeError::Channel(format!(
            "worker terminated before answering request {id}"
        ))),
    }
}

/// Deliver each response to the caller waiting on its id. Runs until the
/// worker thread exits and closes the channel.
fn route_responses(mut responses: UnboundedReceiver<WorkerResponse>, pending: Pending) {
    while let Some(response) = responses.blocking_recv() {
        let id = response.id();
        let waiter = lock(&pending).remove(&id);
        match waiter {
            // The caller may have stopped waiting; nothing to do then
            Some(waiter) => {
                let _ = waiter.send(response);
            }
            None => debug!(%id, "no pending request for response"),
        }
    }
}
