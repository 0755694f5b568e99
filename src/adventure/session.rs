//! One play session of the adventure screen.
//!
//! The session owns the stats store, the sync engine and the cooldown timer.
//! Two scheduled tasks feed it signals (the cooldown tick and the periodic
//! stats refresh); the presentation layer drains them with [`Adventure::pump`]
//! or [`Adventure::wait`]. Dropping the session stops both tasks and lets
//! the sync worker discard any response still in flight.

use super::cooldown::{CooldownTick, CooldownTimer};
use super::reward::{roll_step, StepReward, StepRoll};
use super::story::Story;
use crate::config::ClientConfig;
use crate::game::{PlayerStats, StatsDelta, StatsStore};
use crate::sync::{ServerSync, StatsBackend, SyncError, SyncEvent};
use crate::utils::schedule::ScheduledTask;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdventureError {
    #[error("Still resting, {remaining_secs}s left")]
    OnCooldown { remaining_secs: u64 },

    #[error("Stats have not been loaded yet")]
    NotLoaded,

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionSignal {
    CooldownTick,
    Refresh,
}

/// The immediate result of a step, before the server has answered.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Reward {
        reward: StepReward,
        cooldown_end: DateTime<Utc>,
        /// The optimistic update crossed the XP cap.
        leveled_up: bool,
        seq: u64,
    },
    Story {
        story: &'static Story,
        cooldown_end: DateTime<Utc>,
        seq: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdventureEvent {
    /// Seconds left changed.
    CooldownRemaining(u64),
    CooldownFinished,
    Sync(SyncEvent),
}

pub struct Adventure {
    store: StatsStore,
    sync: ServerSync,
    cooldown: CooldownTimer,
    last_reported: Option<u64>,
    signals: Receiver<SessionSignal>,
    _ticker: ScheduledTask,
    _refresher: Option<ScheduledTask>,
}

/// Posts `signal` every `interval` until the session drops its receiver.
fn signal_task(
    name: &str,
    interval: Duration,
    tx: Sender<SessionSignal>,
    signal: SessionSignal,
) -> ScheduledTask {
    ScheduledTask::every(name, interval, move || tx.send(signal).is_ok())
}

impl Adventure {
    /// Starts the session and requests the player's stats.
    pub fn start<B: StatsBackend>(backend: B, config: &ClientConfig) -> Result<Self, SyncError> {
        let (tx, signals) = mpsc::channel();
        let ticker = signal_task(
            "cooldown-tick",
            config.cooldown_tick(),
            tx.clone(),
            SessionSignal::CooldownTick,
        );
        let refresher = config
            .refresh_interval()
            .map(|interval| signal_task("stats-refresh", interval, tx, SessionSignal::Refresh));

        let mut sync = ServerSync::spawn(backend);
        sync.reload()?;

        Ok(Self {
            store: StatsStore::new(),
            sync,
            cooldown: CooldownTimer::new(),
            last_reported: None,
            signals,
            _ticker: ticker,
            _refresher: refresher,
        })
    }

    /// Blocks until the initial stats arrive.
    pub fn wait_until_loaded(
        &mut self,
        timeout: Duration,
        now: DateTime<Utc>,
    ) -> Result<PlayerStats, SyncError> {
        let events = self.sync.settle(&mut self.store, timeout);
        self.follow_sync(&events, now);

        if self.store.is_loaded() {
            return Ok(self.store.stats().clone());
        }
        let failure = events.into_iter().find_map(|event| match event {
            SyncEvent::Failed { error, .. } => Some(SyncError::Backend(error)),
            _ => None,
        });
        Err(failure.unwrap_or(SyncError::Timeout))
    }

    pub fn stats(&self) -> &PlayerStats {
        self.store.stats()
    }

    pub fn store(&self) -> &StatsStore {
        &self.store
    }

    pub fn cooldown(&self) -> &CooldownTimer {
        &self.cooldown
    }

    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> u64 {
        self.cooldown.remaining_secs(now)
    }

    /// The last sync failure, for an error banner.
    pub fn last_error(&self) -> Option<&str> {
        self.sync.last_error()
    }

    pub fn in_flight(&self) -> usize {
        self.sync.in_flight()
    }

    /// Takes one step: rolls the reward, starts the cooldown and sends the
    /// delta. Refused while the cooldown runs.
    pub fn step(
        &mut self,
        rng: &mut impl Rng,
        now: DateTime<Utc>,
    ) -> Result<StepOutcome, AdventureError> {
        if !self.store.is_loaded() {
            return Err(AdventureError::NotLoaded);
        }
        let remaining_secs = self.cooldown.remaining_secs(now);
        if remaining_secs > 0 {
            return Err(AdventureError::OnCooldown { remaining_secs });
        }

        let level_before = self.store.stats().level;
        let roll = roll_step(level_before, rng);
        let cooldown_end = self.cooldown.start_random(rng, now);
        self.last_reported = None;

        match roll {
            StepRoll::Reward(reward) => {
                let delta =
                    StatsDelta::reward(reward.xp, reward.gold).with_cooldown_end(cooldown_end);
                let seq = self.sync.update_stats(&mut self.store, delta)?;
                debug!(seq, xp = reward.xp, gold = reward.gold, "step rewarded");
                Ok(StepOutcome::Reward {
                    reward,
                    cooldown_end,
                    leveled_up: self.store.stats().level > level_before,
                    seq,
                })
            }
            StepRoll::Story(story) => {
                let delta = StatsDelta::default().with_cooldown_end(cooldown_end);
                let seq = self.sync.update_stats(&mut self.store, delta)?;
                debug!(seq, title = story.title, "step became a story");
                Ok(StepOutcome::Story {
                    story,
                    cooldown_end,
                    seq,
                })
            }
        }
    }

    /// Explicit refresh from the server.
    pub fn refresh(&mut self) -> Result<u64, SyncError> {
        self.sync.reload()
    }

    /// Handles every pending signal and sync response without blocking.
    pub fn pump(&mut self, now: DateTime<Utc>) -> Vec<AdventureEvent> {
        let mut events = Vec::new();
        let mut ticked = false;
        loop {
            match self.signals.try_recv() {
                Ok(SessionSignal::CooldownTick) => ticked = true,
                Ok(SessionSignal::Refresh) => self.background_refresh(),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        let sync_events = self.sync.poll(&mut self.store);
        self.follow_sync(&sync_events, now);
        events.extend(sync_events.into_iter().map(AdventureEvent::Sync));

        if ticked {
            self.tick_cooldown(now, &mut events);
        }
        events
    }

    /// Blocks for the next signal (at most `timeout`), then pumps.
    pub fn wait(&mut self, timeout: Duration) -> Vec<AdventureEvent> {
        let mut events = Vec::new();
        match self.signals.recv_timeout(timeout) {
            Ok(SessionSignal::CooldownTick) => self.tick_cooldown(Utc::now(), &mut events),
            Ok(SessionSignal::Refresh) => self.background_refresh(),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        events.extend(self.pump(Utc::now()));
        events
    }

    /// Blocks until every in-flight request has settled.
    pub fn settle(&mut self, timeout: Duration, now: DateTime<Utc>) -> Vec<AdventureEvent> {
        let events = self.sync.settle(&mut self.store, timeout);
        self.follow_sync(&events, now);
        events.into_iter().map(AdventureEvent::Sync).collect()
    }

    fn background_refresh(&mut self) {
        if self.sync.in_flight() > 0 {
            debug!("request in flight, skipping background refresh");
            return;
        }
        if let Err(error) = self.sync.reload() {
            warn!(%error, "background refresh not sent");
        }
    }

    fn tick_cooldown(&mut self, now: DateTime<Utc>, events: &mut Vec<AdventureEvent>) {
        match self.cooldown.tick(now) {
            CooldownTick::Idle => {}
            CooldownTick::Finished => {
                self.last_reported = None;
                self.store.clear_cooldown();
                events.push(AdventureEvent::CooldownFinished);
            }
            CooldownTick::Remaining(secs) => {
                if self.last_reported != Some(secs) {
                    self.last_reported = Some(secs);
                    events.push(AdventureEvent::CooldownRemaining(secs));
                }
            }
        }
    }

    /// A reload may carry a cooldown persisted by an earlier session.
    fn follow_sync(&mut self, events: &[SyncEvent], now: DateTime<Utc>) {
        for event in events {
            if let SyncEvent::Reloaded { stats, .. } = event {
                if self.cooldown.sync_from_server(stats.cooldown_end, now) {
                    debug!(end = ?stats.cooldown_end, "resuming server cooldown");
                }
            }
        }
    }
}
