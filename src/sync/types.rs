use crate::game::{PlayerStats, StatsDelta, StatsPatch};
use thiserror::Error;

/// Why a single backend request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Could not read server response: {0}")]
    Decode(String),

    #[error("Not logged in")]
    NotAuthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Timed out waiting for the server")]
    Timeout,

    #[error("Sync worker stopped")]
    WorkerStopped,
}

/// What the owner learns when a response is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// An update was confirmed and its authoritative stats applied.
    Confirmed {
        seq: u64,
        stats: PlayerStats,
        level_up: bool,
    },

    /// A full reload completed.
    Reloaded { seq: u64, stats: PlayerStats },

    /// A success response arrived after a newer request was dispatched and
    /// was not applied.
    Stale { seq: u64 },

    /// A request failed. Local stats were left as they were; `reload` is the
    /// sequence of the recovery reload, if one was dispatched.
    Failed {
        seq: u64,
        error: BackendError,
        reload: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RequestKind {
    Update(StatsDelta),
    Reload,
}

#[derive(Debug)]
pub(crate) struct SyncRequest {
    pub seq: u64,
    pub kind: RequestKind,
}

#[derive(Debug)]
pub(crate) struct SyncResponse {
    pub seq: u64,
    pub kind: RequestKind,
    pub result: Result<StatsPatch, BackendError>,
}
