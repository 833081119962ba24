//! Native worker: a dedicated thread fed over a message channel.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use super::{process_request, EngineCell};
use crate::engine::EngineLoader;
use crate::error::EncodeError;
use crate::protocol::{WorkerRequest, WorkerResponse};

/// Handle to a running encode worker thread.
///
/// Dropping the handle (or calling [`terminate`](Self::terminate)) closes the
/// request channel; the thread finishes the request it is running, if any,
/// and exits. The engine goes with it.
pub struct EncodeWorker {
    requests: UnboundedSender<WorkerRequest>,
    thread: JoinHandle<()>,
}

impl EncodeWorker {
    /// Start a worker thread. Returns the handle and the receiving end of the
    /// response channel.
    pub fn spawn(
        loader: Arc<dyn EngineLoader>,
        thread_name: &str,
    ) -> Result<(Self, UnboundedReceiver<WorkerResponse>), EncodeError> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        let thread = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || run(EngineCell::new(loader), request_rx, response_tx))
            .map_err(|e| EncodeError::Channel(format!("failed to start worker thread: {e}")))?;

        debug!(thread = thread_name, "encode worker spawned");
        Ok((
            Self {
                requests: request_tx,
                thread,
            },
            response_rx,
        ))
    }

    /// Post a message to the worker. The request's buffers move with it.
    pub fn post(&self, request: WorkerRequest) -> Result<(), EncodeError> {
        self.requests
            .send(request)
            .map_err(|_| EncodeError::Channel("worker has terminated".to_string()))
    }

    /// Check if the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Close the request channel without waiting for the thread.
    ///
    /// The returned handle can be joined to wait for the exit, or dropped to
    /// detach.
    pub fn terminate(self) -> JoinHandle<()> {
        debug!("encode worker terminated");
        drop(self.requests);
        self.thread
    }

    /// Close the request channel and wait for the thread to exit.
    pub fn join(self) -> Result<(), EncodeError> {
        drop(self.requests);
        self.thread
            .join()
            .map_err(|_| EncodeError::Channel("worker thread panicked".to_string()))
    }
}

fn run(
    engine: EngineCell,
    mut requests: UnboundedReceiver<WorkerRequest>,
    responses: UnboundedSender<WorkerResponse>,
) {
    while let Some(message) = requests.blocking_recv() {
        match message {
            WorkerRequest::Encode(request) => {
                let response = process_request(&engine, request);
                if responses.send(response).is_err() {
                    debug!("response channel closed, stopping worker");
                    break;
                }
            }
        }
    }
    debug!(loads = engine.load_attempts(), "encode worker stopped");
}
