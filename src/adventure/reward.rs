//! Random rewards for a single adventure step.

use super::story::{pick_story, Story};
use crate::game::constants::*;
use crate::game::leveling::xp_cap;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReward {
    pub xp: u64,
    pub gold: u64,
}

impl StepReward {
    pub fn is_empty(&self) -> bool {
        self.xp == 0 && self.gold == 0
    }
}

/// What a step turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRoll {
    Reward(StepReward),
    /// No xp or gold this step; the player reads a story instead.
    Story(&'static Story),
}

/// Zero 35% of the time, otherwise 1% to 4.5% of the level's XP cap.
pub fn roll_xp(level: u32, rng: &mut impl Rng) -> u64 {
    if rng.gen::<f64>() <= XP_ZERO_CHANCE {
        return 0;
    }
    let fraction = rng.gen_range(XP_REWARD_MIN_FRACTION..XP_REWARD_MAX_FRACTION);
    (xp_cap(level) as f64 * fraction).floor() as u64
}

/// Zero 20% of the time, otherwise 0..=50 gold.
pub fn roll_gold(rng: &mut impl Rng) -> u64 {
    if rng.gen::<f64>() <= GOLD_ZERO_CHANCE {
        return 0;
    }
    rng.gen_range(0..=GOLD_REWARD_MAX)
}

pub fn roll_step(level: u32, rng: &mut impl Rng) -> StepRoll {
    if rng.gen_bool(STORY_CHANCE) {
        return StepRoll::Story(pick_story(rng));
    }
    StepRoll::Reward(StepReward {
        xp: roll_xp(level, rng),
        gold: roll_gold(rng),
    })
}
