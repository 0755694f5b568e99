// XP and leveling
pub const XP_CAP_BASE: f64 = 50.0;
pub const XP_CAP_EXPONENT: f64 = 1.4;
pub const STARTING_LEVEL: u32 = 1;

// Step rewards
pub const STORY_CHANCE: f64 = 0.05;
pub const XP_ZERO_CHANCE: f64 = 0.35;
pub const XP_REWARD_MIN_FRACTION: f64 = 0.01;
pub const XP_REWARD_MAX_FRACTION: f64 = 0.045;
pub const GOLD_ZERO_CHANCE: f64 = 0.20;
pub const GOLD_REWARD_MAX: u64 = 50;

// Step cooldown
pub const STEP_COOLDOWN_MIN_SECONDS: i64 = 3;
pub const STEP_COOLDOWN_MAX_SECONDS: i64 = 7;
pub const COOLDOWN_TICK_MS: u64 = 250;
pub const COOLDOWN_TICK_MIN_MS: u64 = 50;

// Backend
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const HTTP_TIMEOUT_SECONDS: u64 = 10;
pub const STATS_REFRESH_INTERVAL_SECONDS: u64 = 30;
pub const SYNC_SETTLE_TIMEOUT_MS: u64 = 5_000;

// Local files
pub const DATA_DIR_NAME: &str = ".pixmon";
pub const CONFIG_FILE: &str = "config.json";
pub const SESSION_FILE: &str = "session.json";
pub const DEFAULT_LOG_FILTER: &str = "pixmon=info";
