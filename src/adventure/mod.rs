//! The adventure stepping loop: rewards, stories, the step cooldown and the
//! session that ties them to the server.

pub mod cooldown;
pub mod reward;
pub mod session;
pub mod story;

pub use cooldown::{CooldownState, CooldownTick, CooldownTimer};
pub use reward::{roll_gold, roll_step, roll_xp, StepReward, StepRoll};
pub use session::{Adventure, AdventureError, AdventureEvent, StepOutcome};
pub use story::{Story, STORIES};
