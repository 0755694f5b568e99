//! Pixmon - adventure stats core for the Pixmon client
//!
//! Player stats, the level curve, step rewards and cooldown, and the
//! optimistic synchronization of all of it with the Pixmon REST backend.

pub mod adventure;
pub mod auth;
pub mod config;
pub mod game;
pub mod sync;
pub mod utils;

pub use adventure::{Adventure, AdventureError, AdventureEvent, StepOutcome};
pub use auth::AuthSession;
pub use config::ClientConfig;
pub use game::{xp_cap, PlayerStats, StatsDelta, StatsPatch, StatsStore};
pub use sync::{
    BackendError, HttpBackend, MemoryBackend, ServerSync, StatsBackend, SyncError, SyncEvent,
};
