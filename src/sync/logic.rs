//! Optimistic update and reconciliation against the authoritative backend.
//!
//! Every stats-affecting action goes through [`ServerSync::update_stats`]:
//! the delta is applied to the local [`StatsStore`] immediately, then sent to
//! the backend on the sync worker. Responses are applied by the owner of the
//! store in [`ServerSync::poll`] or [`ServerSync::settle`]:
//!
//! - success overwrites local fields with the server's values, unless a newer
//!   request has been dispatched since (the response is then stale)
//! - failure keeps the optimistic values, records an error for the UI and
//!   dispatches a best-effort reload
//!
//! Level-ups are detected locally (`xp >= xp_cap(level)`) and confirmed by the
//! server through a follow-up `{level: level + 1, resetXp: true}` request.

use super::backend::StatsBackend;
use super::types::{RequestKind, SyncError, SyncEvent, SyncRequest, SyncResponse};
use super::worker::SyncWorker;
use crate::game::{PlayerStats, StatsDelta, StatsStore};
use std::collections::BTreeSet;
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct ServerSync {
    worker: SyncWorker,
    next_seq: u64,
    latest_dispatched: u64,
    in_flight: BTreeSet<u64>,
    pending_level_up: Option<u64>,
    /// Set when a level-up request fails, so a server that refuses it is not
    /// asked again after every reload. Cleared by the next confirmed update.
    level_up_blocked: bool,
    last_error: Option<String>,
}

impl ServerSync {
    pub fn spawn<B: StatsBackend>(backend: B) -> Self {
        Self::with_worker(SyncWorker::spawn(backend))
    }

    fn with_worker(worker: SyncWorker) -> Self {
        Self {
            worker,
            next_seq: 1,
            latest_dispatched: 0,
            in_flight: BTreeSet::new(),
            pending_level_up: None,
            level_up_blocked: false,
            last_error: None,
        }
    }

    /// Applies `delta` optimistically and sends it to the backend.
    /// Returns the request's sequence number.
    pub fn update_stats(
        &mut self,
        store: &mut StatsStore,
        delta: StatsDelta,
    ) -> Result<u64, SyncError> {
        store.apply(&delta);
        if delta.is_level_up() {
            let seq = self.dispatch(RequestKind::Update(delta))?;
            self.pending_level_up = Some(seq);
            return Ok(seq);
        }

        let seq = self.dispatch(RequestKind::Update(delta))?;
        self.check_level_up(store);
        Ok(seq)
    }

    /// Blocking form of [`update_stats`](Self::update_stats): resolves once
    /// this request and any follow-ups have settled.
    pub fn update_stats_and_wait(
        &mut self,
        store: &mut StatsStore,
        delta: StatsDelta,
        timeout: Duration,
    ) -> Result<PlayerStats, SyncError> {
        let seq = self.update_stats(store, delta)?;
        let events = self.settle(store, timeout);

        let failure = events.into_iter().find_map(|event| match event {
            SyncEvent::Failed { seq: failed, error, .. } if failed >= seq => Some(error),
            _ => None,
        });
        if let Some(error) = failure {
            return Err(SyncError::Backend(error));
        }
        if !self.in_flight.is_empty() {
            return Err(SyncError::Timeout);
        }
        Ok(store.stats().clone())
    }

    /// Requests a full reload of the authoritative stats.
    pub fn reload(&mut self) -> Result<u64, SyncError> {
        self.dispatch(RequestKind::Reload)
    }

    /// Applies every response that has already arrived.
    pub fn poll(&mut self, store: &mut StatsStore) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        loop {
            match self.worker.try_recv() {
                Ok(response) => self.handle_response(store, response, &mut events),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.worker_lost();
                    break;
                }
            }
        }
        events
    }

    /// Waits until nothing is in flight or `timeout` elapses.
    pub fn settle(&mut self, store: &mut StatsStore, timeout: Duration) -> Vec<SyncEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();

        while !self.in_flight.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.worker.recv_timeout(deadline - now) {
                Ok(response) => self.handle_response(store, response, &mut events),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    self.worker_lost();
                    break;
                }
            }
        }
        events
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending_level_up(&self) -> Option<u64> {
        self.pending_level_up
    }

    /// The most recent failure, for display. Cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn dispatch(&mut self, kind: RequestKind) -> Result<u64, SyncError> {
        let seq = self.next_seq;
        self.next_seq += 1;

        debug!(seq, ?kind, "dispatching stats request");
        if let Err(error) = self.worker.send(SyncRequest { seq, kind }) {
            self.last_error = Some(error.to_string());
            return Err(error);
        }

        self.latest_dispatched = seq;
        self.in_flight.insert(seq);
        Ok(seq)
    }

    /// Issues the level-up follow-up when local xp has reached the cap.
    fn check_level_up(&mut self, store: &mut StatsStore) -> Option<u64> {
        if self.pending_level_up.is_some() || self.level_up_blocked {
            return None;
        }
        let stats = store.stats();
        if !stats.needs_level_up() {
            return None;
        }

        let next_level = stats.level.saturating_add(1);
        info!(
            level = next_level,
            xp = stats.xp,
            cap = stats.xp_cap(),
            "xp cap reached, requesting level up"
        );
        let delta = StatsDelta::level_up(next_level);
        match self.dispatch(RequestKind::Update(delta.clone())) {
            Ok(seq) => {
                store.apply(&delta);
                self.pending_level_up = Some(seq);
                Some(seq)
            }
            Err(error) => {
                warn!(%error, "level up request not sent");
                None
            }
        }
    }

    fn handle_response(
        &mut self,
        store: &mut StatsStore,
        response: SyncResponse,
        events: &mut Vec<SyncEvent>,
    ) {
        let seq = response.seq;
        self.in_flight.remove(&seq);
        let level_up = self.pending_level_up == Some(seq);
        if level_up {
            self.pending_level_up = None;
        }

        match response.result {
            Ok(patch) => {
                if seq < self.latest_dispatched {
                    debug!(seq, latest = self.latest_dispatched, "ignoring stale stats response");
                    events.push(SyncEvent::Stale { seq });
                    return;
                }

                store.overwrite(&patch);
                self.last_error = None;
                let stats = store.stats().clone();
                match response.kind {
                    RequestKind::Reload => {
                        debug!(seq, level = stats.level, xp = stats.xp, "stats reloaded");
                        events.push(SyncEvent::Reloaded { seq, stats });
                    }
                    RequestKind::Update(_) => {
                        if level_up {
                            info!(level = stats.level, "level up confirmed");
                        } else {
                            self.level_up_blocked = false;
                        }
                        debug!(seq, level = stats.level, xp = stats.xp, "stats confirmed");
                        events.push(SyncEvent::Confirmed {
                            seq,
                            stats,
                            level_up,
                        });
                    }
                }
                self.check_level_up(store);
            }
            Err(error) => {
                warn!(seq, %error, "stats request failed");
                self.last_error = Some(error.to_string());
                if level_up {
                    self.level_up_blocked = true;
                }
                let reload = match response.kind {
                    RequestKind::Update(_) => self.dispatch(RequestKind::Reload).ok(),
                    RequestKind::Reload => None,
                };
                events.push(SyncEvent::Failed { seq, error, reload });
            }
        }
    }

    fn worker_lost(&mut self) {
        warn!("sync worker disconnected");
        self.in_flight.clear();
        self.pending_level_up = None;
        self.last_error = Some(SyncError::WorkerStopped.to_string());
    }
}
