//! Level curve math shared by the optimistic level-up check and progress display.

use super::constants::{XP_CAP_BASE, XP_CAP_EXPONENT};

/// XP required to complete `level`: `floor(50 * level^1.4)`.
///
/// Level 0 is not a valid level and is treated as level 1.
pub fn xp_cap(level: u32) -> u64 {
    let level = level.max(1);
    (XP_CAP_BASE * f64::powf(level as f64, XP_CAP_EXPONENT)).floor() as u64
}

/// True once `xp` has reached the cap of `level`.
pub fn is_level_complete(level: u32, xp: u64) -> bool {
    xp >= xp_cap(level)
}

/// Progress through the current level as a percentage, clamped to 0..=100.
pub fn level_progress_percent(level: u32, xp: u64) -> f64 {
    let cap = xp_cap(level) as f64;
    ((xp as f64 / cap) * 100.0).clamp(0.0, 100.0)
}
