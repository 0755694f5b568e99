//! Integration test: stepping, optimistic updates and level-ups
//!
//! Drives the sync engine and a full adventure session against the
//! in-memory backend and checks the reconciled stats.

use chrono::{Duration as ChronoDuration, Utc};
use pixmon::adventure::{Adventure, StepOutcome};
use pixmon::sync::{MemoryBackend, ServerSync, SyncEvent};
use pixmon::{xp_cap, ClientConfig, PlayerStats, StatsDelta, StatsStore};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn quiet_config() -> ClientConfig {
    ClientConfig {
        refresh_interval_secs: 0,
        ..ClientConfig::default()
    }
}

// =============================================================================
// ServerSync Scenarios
// =============================================================================

#[test]
fn test_level_one_xp_forty_plus_fifteen_levels_up() {
    let initial = PlayerStats::new(1, 40, 0, 0);
    let backend = MemoryBackend::new(initial.clone());
    let mut sync = ServerSync::spawn(backend.clone());
    let mut store = StatsStore::with_stats(initial);

    let stats = sync
        .update_stats_and_wait(&mut store, StatsDelta::reward(15, 0), WAIT)
        .unwrap();

    assert_eq!(stats.level, 2);
    assert_eq!(stats.xp, 0);
    assert_eq!(backend.stats().level, 2);
    assert_eq!(backend.stats().xp, 0);

    let updates = backend.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].xp_delta, Some(15));
    assert_eq!(updates[1], StatsDelta::level_up(2));
}

#[test]
fn test_zero_reward_does_not_change_authoritative_stats() {
    let initial = PlayerStats::new(7, 300, 1_000, 12);
    let backend = MemoryBackend::new(initial.clone());
    let mut sync = ServerSync::spawn(backend.clone());
    let mut store = StatsStore::with_stats(initial.clone());

    for _ in 0..5 {
        sync.update_stats_and_wait(&mut store, StatsDelta::reward(0, 0), WAIT)
            .unwrap();
    }
    assert_eq!(backend.stats(), initial);
    assert_eq!(store.stats(), &initial);
}

#[test]
fn test_server_level_ahead_of_client_wins() {
    let backend = MemoryBackend::new(PlayerStats::new(5, 10, 0, 0));
    let mut sync = ServerSync::spawn(backend.clone());
    // The client still believes it is level 4.
    let mut store = StatsStore::with_stats(PlayerStats::new(4, 10, 0, 0));

    let stats = sync
        .update_stats_and_wait(&mut store, StatsDelta::reward(3, 2), WAIT)
        .unwrap();
    assert_eq!(stats.level, 5);
    assert_eq!(stats.xp, 13);
}

#[test]
fn test_rapid_updates_apply_in_order_and_last_response_wins() {
    let backend = MemoryBackend::new(PlayerStats::new(10, 0, 0, 0));
    let mut sync = ServerSync::spawn(backend.clone());
    let mut store = StatsStore::with_stats(PlayerStats::new(10, 0, 0, 0));

    let seqs: Vec<u64> = (1..=5)
        .map(|gold| sync.update_stats(&mut store, StatsDelta::reward(1, gold)).unwrap())
        .collect();
    // All five optimistic updates are already visible.
    assert_eq!(store.stats().gold, 15);

    let events = sync.settle(&mut store, WAIT);
    let last = *seqs.last().unwrap();
    for event in &events {
        match event {
            SyncEvent::Stale { seq } => assert!(*seq < last),
            SyncEvent::Confirmed { seq, .. } => assert_eq!(*seq, last),
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(store.stats().gold, 15);
    assert_eq!(store.stats().xp, 5);
    assert_eq!(store.stats(), &backend.stats());
}

// =============================================================================
// Adventure Session
// =============================================================================

#[test]
fn test_many_steps_keep_client_and_server_consistent() {
    let backend = MemoryBackend::new(PlayerStats::default());
    let mut adventure = Adventure::start(backend.clone(), &quiet_config()).unwrap();
    let mut now = Utc::now();
    adventure.wait_until_loaded(WAIT, now).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(2026);
    let mut stories = 0;
    for _ in 0..200 {
        match adventure.step(&mut rng, now).unwrap() {
            StepOutcome::Reward { reward, .. } => assert!(reward.gold <= 50),
            StepOutcome::Story { .. } => stories += 1,
        }
        adventure.settle(WAIT, now);

        let stats = adventure.stats().clone();
        assert_eq!(stats, backend.stats());
        assert!(stats.xp < xp_cap(stats.level), "{:?}", stats);

        now += ChronoDuration::seconds(8);
    }

    assert!(adventure.stats().level >= 2);
    assert!(stories < 40);
}
