//! The rest period between two steps.

use crate::game::constants::{STEP_COOLDOWN_MAX_SECONDS, STEP_COOLDOWN_MIN_SECONDS};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CooldownState {
    #[default]
    Idle,
    Cooldown {
        end: DateTime<Utc>,
    },
}

/// Result of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownTick {
    Idle,
    /// Still cooling down; whole seconds left, rounded up.
    Remaining(u64),
    /// The cooldown ended on this tick. Reported once per cooldown.
    Finished,
}

/// Whole seconds from `now` until `end`, rounded up, never negative.
pub fn remaining_secs(end: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let ms = (end - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        ((ms + 999) / 1000) as u64
    }
}

#[derive(Debug, Clone, Default)]
pub struct CooldownTimer {
    state: CooldownState,
}

impl CooldownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        match self.state {
            CooldownState::Idle => None,
            CooldownState::Cooldown { end } => Some(end),
        }
    }

    pub fn start(&mut self, duration: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
        let end = now + duration;
        self.state = CooldownState::Cooldown { end };
        end
    }

    /// Starts a cooldown of 3 to 7 whole seconds.
    pub fn start_random(&mut self, rng: &mut impl Rng, now: DateTime<Utc>) -> DateTime<Utc> {
        let secs = rng.gen_range(STEP_COOLDOWN_MIN_SECONDS..=STEP_COOLDOWN_MAX_SECONDS);
        self.start(Duration::seconds(secs), now)
    }

    /// Adopts a cooldown persisted by the server if it is still running.
    /// Returns true when the timer entered (or stayed in) cooldown because of it.
    pub fn sync_from_server(&mut self, end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match end {
            Some(end) if end > now => {
                self.state = CooldownState::Cooldown { end };
                true
            }
            _ => false,
        }
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        self.end().map_or(0, |end| remaining_secs(end, now))
    }

    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> CooldownTick {
        match self.state {
            CooldownState::Idle => CooldownTick::Idle,
            CooldownState::Cooldown { end } => {
                if now >= end {
                    self.state = CooldownState::Idle;
                    CooldownTick::Finished
                } else {
                    CooldownTick::Remaining(remaining_secs(end, now))
                }
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = CooldownState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_remaining_rounds_up() {
        let now = t0();
        assert_eq!(remaining_secs(now + Duration::milliseconds(5000), now), 5);
        assert_eq!(remaining_secs(now + Duration::milliseconds(4001), now), 5);
        assert_eq!(remaining_secs(now + Duration::milliseconds(1), now), 1);
        assert_eq!(remaining_secs(now, now), 0);
        assert_eq!(remaining_secs(now - Duration::seconds(3), now), 0);
    }

    #[test]
    fn test_new_timer_is_idle_and_ready() {
        let mut timer = CooldownTimer::new();
        assert_eq!(timer.state(), CooldownState::Idle);
        assert!(timer.is_ready(t0()));
        assert_eq!(timer.tick(t0()), CooldownTick::Idle);
    }

    #[test]
    fn test_start_random_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..500 {
            let mut timer = CooldownTimer::new();
            let end = timer.start_random(&mut rng, t0());
            let secs = (end - t0()).num_seconds();
            assert!((3..=7).contains(&secs));
            seen.insert(secs);
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_sync_from_server_future_enters_cooldown() {
        let mut timer = CooldownTimer::new();
        let end = t0() + Duration::seconds(4);
        assert!(timer.sync_from_server(Some(end), t0()));
        assert_eq!(timer.state(), CooldownState::Cooldown { end });
        assert_eq!(timer.remaining_secs(t0()), 4);
    }

    #[test]
    fn test_sync_from_server_past_or_missing_stays_idle() {
        let mut timer = CooldownTimer::new();
        assert!(!timer.sync_from_server(Some(t0() - Duration::seconds(1)), t0()));
        assert!(!timer.sync_from_server(None, t0()));
        assert_eq!(timer.state(), CooldownState::Idle);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut timer = CooldownTimer::new();
        timer.start(Duration::seconds(5), t0());
        assert!(!timer.is_ready(t0()));
        timer.cancel();
        assert!(timer.is_ready(t0()));
    }
}
