//! Player stats, the level curve and shared constants.

pub mod constants;
pub mod leveling;
pub mod stats;

pub use constants::*;
pub use leveling::{is_level_complete, level_progress_percent, xp_cap};
pub use stats::{PlayerStats, StatsDelta, StatsPatch, StatsStore};
