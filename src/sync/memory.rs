//! In-process stand-in for the stats backend, used by `pixmon demo` and tests.

use super::backend::StatsBackend;
use super::types::BackendError;
use crate::game::{PlayerStats, StatsDelta, StatsPatch};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct MemoryState {
    stats: PlayerStats,
    online: bool,
    fail_next: Option<BackendError>,
    updates: Vec<StatsDelta>,
    fetches: usize,
}

/// Holds the authoritative stats record in memory.
///
/// Cloning yields another handle to the same record, so a test can keep one
/// handle while the sync worker owns the other.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(PlayerStats::default())
    }
}

impl MemoryBackend {
    pub fn new(stats: PlayerStats) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                stats,
                online: true,
                fail_next: None,
                updates: Vec::new(),
                fetches: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The server's current record.
    pub fn stats(&self) -> PlayerStats {
        self.lock().stats.clone()
    }

    pub fn set_stats(&self, stats: PlayerStats) {
        self.lock().stats = stats;
    }

    /// While offline every request fails with a network error.
    pub fn set_online(&self, online: bool) {
        self.lock().online = online;
    }

    /// Makes the next request fail with `error`.
    pub fn fail_next(&self, error: BackendError) {
        self.lock().fail_next = Some(error);
    }

    /// Every update body received, in arrival order.
    pub fn updates(&self) -> Vec<StatsDelta> {
        self.lock().updates.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    fn check_available(state: &mut MemoryState) -> Result<(), BackendError> {
        if !state.online {
            return Err(BackendError::Network("connection refused".to_string()));
        }
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl StatsBackend for MemoryBackend {
    fn fetch_stats(&self) -> Result<StatsPatch, BackendError> {
        let mut state = self.lock();
        Self::check_available(&mut state)?;
        state.fetches += 1;
        Ok(StatsPatch::from(&state.stats))
    }

    fn update_stats(&self, delta: &StatsDelta) -> Result<StatsPatch, BackendError> {
        let mut state = self.lock();
        Self::check_available(&mut state)?;
        state.updates.push(delta.clone());

        // Level-ups may only advance one level at a time.
        if let Some(level) = delta.level {
            if level != state.stats.level.saturating_add(1) {
                return Err(BackendError::Rejected {
                    status: 400,
                    message: format!("Invalid level {} (current {})", level, state.stats.level),
                });
            }
        }

        state.stats.apply_delta(delta);
        Ok(StatsPatch::from(&state.stats))
    }
}
