//! Background thread that performs backend requests in dispatch order.

use super::backend::StatsBackend;
use super::types::{RequestKind, SyncError, SyncRequest, SyncResponse};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::debug;

pub(crate) struct SyncWorker {
    requests: Sender<SyncRequest>,
    responses: Receiver<SyncResponse>,
}

impl SyncWorker {
    /// The thread exits once this handle is dropped; a response that
    /// completes afterwards is discarded.
    pub fn spawn<B: StatsBackend>(backend: B) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<SyncRequest>();
        let (response_tx, response_rx) = mpsc::channel::<SyncResponse>();

        thread::spawn(move || {
            for request in request_rx {
                let result = match &request.kind {
                    RequestKind::Update(delta) => backend.update_stats(delta),
                    RequestKind::Reload => backend.fetch_stats(),
                };
                let response = SyncResponse {
                    seq: request.seq,
                    kind: request.kind,
                    result,
                };
                if response_tx.send(response).is_err() {
                    break;
                }
            }
            debug!("sync worker stopped");
        });

        Self {
            requests: request_tx,
            responses: response_rx,
        }
    }

    /// A handle whose thread has already exited.
    #[cfg(test)]
    pub fn stopped() -> Self {
        let (requests, _) = mpsc::channel::<SyncRequest>();
        let (_, responses) = mpsc::channel::<SyncResponse>();
        Self {
            requests,
            responses,
        }
    }

    pub fn send(&self, request: SyncRequest) -> Result<(), SyncError> {
        self.requests
            .send(request)
            .map_err(|_| SyncError::WorkerStopped)
    }

    pub fn try_recv(&self) -> Result<SyncResponse, TryRecvError> {
        self.responses.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<SyncResponse, RecvTimeoutError> {
        self.responses.recv_timeout(timeout)
    }
}
