//! Player stats, the deltas that mutate them, and the store that owns them.
//!
//! `StatsDelta` and `StatsPatch` double as the wire types of the
//! `update-stats` endpoint, so their serde shape is camelCase JSON.

use super::constants::STARTING_LEVEL;
use super::leveling::{is_level_complete, xp_cap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The player's progression stats as the client currently believes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub level: u32,
    #[serde(deserialize_with = "wire_count::deserialize")]
    pub xp: u64,
    #[serde(deserialize_with = "wire_count::deserialize")]
    pub gold: u64,
    #[serde(deserialize_with = "wire_count::deserialize")]
    pub diamonds: u64,
    #[serde(default, with = "wire_time")]
    pub cooldown_end: Option<DateTime<Utc>>,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            level: STARTING_LEVEL,
            xp: 0,
            gold: 0,
            diamonds: 0,
            cooldown_end: None,
        }
    }
}

impl PlayerStats {
    pub fn new(level: u32, xp: u64, gold: u64, diamonds: u64) -> Self {
        Self {
            level: level.max(1),
            xp,
            gold,
            diamonds,
            cooldown_end: None,
        }
    }

    /// XP needed to complete the current level.
    pub fn xp_cap(&self) -> u64 {
        xp_cap(self.level)
    }

    /// The client-side level-up trigger: xp has reached the current cap.
    pub fn needs_level_up(&self) -> bool {
        is_level_complete(self.level, self.xp)
    }

    /// Sums a delta into these stats. Counters saturate at zero.
    ///
    /// The level is set before xp is touched so a `{level, resetXp}` pair
    /// always lands on xp 0 of the new level.
    pub fn apply_delta(&mut self, delta: &StatsDelta) {
        if let Some(level) = delta.level {
            self.level = level.max(1);
        }
        if let Some(xp) = delta.xp_delta {
            self.xp = add_signed(self.xp, xp);
        }
        if delta.reset_xp == Some(true) {
            self.xp = 0;
        }
        if let Some(gold) = delta.gold_delta {
            self.gold = add_signed(self.gold, gold);
        }
        if let Some(diamonds) = delta.diamonds_delta {
            self.diamonds = add_signed(self.diamonds, diamonds);
        }
        if let Some(end) = delta.cooldown_end {
            self.cooldown_end = Some(end);
        }
    }

    /// Overwrites every field present in an authoritative response.
    pub fn apply_patch(&mut self, patch: &StatsPatch) {
        if let Some(level) = patch.level {
            self.level = level.max(1);
        }
        if let Some(xp) = patch.xp {
            self.xp = xp;
        }
        if let Some(gold) = patch.gold {
            self.gold = gold;
        }
        if let Some(diamonds) = patch.diamonds {
            self.diamonds = diamonds;
        }
        if let Some(end) = patch.cooldown_end {
            self.cooldown_end = end;
        }
    }
}

fn add_signed(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

/// Body of `POST /users/{id}/update-stats`. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diamonds_delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_xp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "wire_time")]
    pub cooldown_end: Option<DateTime<Utc>>,
}

impl StatsDelta {
    /// The delta produced by a rewarded step.
    pub fn reward(xp: u64, gold: u64) -> Self {
        Self {
            xp_delta: Some(xp as i64),
            gold_delta: Some(gold as i64),
            ..Self::default()
        }
    }

    /// Follow-up request that confirms a client-detected level-up.
    pub fn level_up(next_level: u32) -> Self {
        Self {
            level: Some(next_level),
            reset_xp: Some(true),
            ..Self::default()
        }
    }

    pub fn with_cooldown_end(mut self, end: DateTime<Utc>) -> Self {
        self.cooldown_end = Some(end);
        self
    }

    pub fn with_diamonds(mut self, diamonds: i64) -> Self {
        self.diamonds_delta = Some(diamonds);
        self
    }

    pub fn is_level_up(&self) -> bool {
        self.level.is_some() && self.reset_xp == Some(true)
    }

    /// True when applying the delta changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Authoritative stats returned by the backend. Only present fields are
/// applied; `cooldownEnd: null` clears the cooldown while a missing
/// `cooldownEnd` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPatch {
    pub level: Option<u32>,
    #[serde(default, deserialize_with = "wire_count::deserialize_option")]
    pub xp: Option<u64>,
    #[serde(default, deserialize_with = "wire_count::deserialize_option")]
    pub gold: Option<u64>,
    #[serde(default, deserialize_with = "wire_count::deserialize_option")]
    pub diamonds: Option<u64>,
    #[serde(default, deserialize_with = "wire_time::deserialize_present")]
    pub cooldown_end: Option<Option<DateTime<Utc>>>,
}

impl From<&PlayerStats> for StatsPatch {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            level: Some(stats.level),
            xp: Some(stats.xp),
            gold: Some(stats.gold),
            diamonds: Some(stats.diamonds),
            cooldown_end: Some(stats.cooldown_end),
        }
    }
}

/// Owns the stats of one logged-in player.
///
/// Every mutation bumps `revision` so a view can tell when to redraw.
#[derive(Debug, Default)]
pub struct StatsStore {
    stats: PlayerStats,
    loaded: bool,
    revision: u64,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: PlayerStats) -> Self {
        Self {
            stats,
            loaded: true,
            revision: 0,
        }
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Whether authoritative stats have been received at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Optimistic update, applied before the server has answered.
    pub fn apply(&mut self, delta: &StatsDelta) {
        self.stats.apply_delta(delta);
        self.revision += 1;
    }

    /// Authoritative update from a server response.
    pub fn overwrite(&mut self, patch: &StatsPatch) {
        self.stats.apply_patch(patch);
        self.loaded = true;
        self.revision += 1;
    }

    /// Drops a cooldown window that has run out.
    pub fn clear_cooldown(&mut self) {
        if self.stats.cooldown_end.take().is_some() {
            self.revision += 1;
        }
    }

    /// Discards everything on logout.
    pub fn clear(&mut self) {
        self.stats = PlayerStats::default();
        self.loaded = false;
        self.revision += 1;
    }
}

/// Counters are plain JSON numbers. A fractional value is floored and a
/// negative one reads as zero.
mod wire_count {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Whole(u64),
        Fractional(f64),
    }

    fn floor(raw: RawCount) -> u64 {
        match raw {
            RawCount::Whole(n) => n,
            RawCount::Fractional(n) => n.max(0.0).floor() as u64,
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        RawCount::deserialize(deserializer).map(floor)
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        Ok(Option::<RawCount>::deserialize(deserializer)?.map(floor))
    }
}

/// `cooldownEnd` is written as epoch milliseconds; epoch milliseconds and
/// RFC 3339 strings are both accepted on input.
mod wire_time {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(i64),
        FloatMillis(f64),
        Text(String),
    }

    fn from_millis<E: Error>(ms: i64) -> Result<DateTime<Utc>, E> {
        Utc.timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| E::custom(format!("timestamp out of range: {}", ms)))
    }

    fn to_datetime<E: Error>(raw: RawTimestamp) -> Result<DateTime<Utc>, E> {
        match raw {
            RawTimestamp::Millis(ms) => from_millis(ms),
            RawTimestamp::FloatMillis(ms) => from_millis(ms as i64),
            RawTimestamp::Text(text) => match text.parse::<i64>() {
                Ok(ms) => from_millis(ms),
                Err(_) => DateTime::parse_from_rfc3339(&text)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(E::custom),
            },
        }
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => serializer.serialize_some(&t.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<RawTimestamp>::deserialize(deserializer)?
            .map(to_datetime)
            .transpose()
    }

    /// Used with `#[serde(default)]`: a missing field stays `None`, an
    /// explicit `null` becomes `Some(None)`.
    pub fn deserialize_present<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<DateTime<Utc>>>, D::Error> {
        deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_stats_start_at_level_one() {
        let stats = PlayerStats::default();
        assert_eq!(stats.level, 1);
        assert_eq!(stats.xp, 0);
        assert_eq!(stats.xp_cap(), 50);
        assert!(stats.cooldown_end.is_none());
    }

    #[test]
    fn test_apply_delta_sums_counters() {
        let mut stats = PlayerStats::new(1, 10, 5, 2);
        stats.apply_delta(&StatsDelta::reward(15, 20).with_diamonds(3));
        assert_eq!(stats.xp, 25);
        assert_eq!(stats.gold, 25);
        assert_eq!(stats.diamonds, 5);
    }

    #[test]
    fn test_apply_delta_negative_saturates_at_zero() {
        let mut stats = PlayerStats::new(1, 0, 5, 2);
        stats.apply_delta(&StatsDelta {
            gold_delta: Some(-10),
            diamonds_delta: Some(-1),
            ..StatsDelta::default()
        });
        assert_eq!(stats.gold, 0);
        assert_eq!(stats.diamonds, 1);
    }

    #[test]
    fn test_apply_level_up_resets_xp() {
        let mut stats = PlayerStats::new(1, 55, 0, 0);
        assert!(stats.needs_level_up());
        stats.apply_delta(&StatsDelta::level_up(2));
        assert_eq!(stats.level, 2);
        assert_eq!(stats.xp, 0);
        assert!(!stats.needs_level_up());
    }

    #[test]
    fn test_apply_patch_only_overwrites_present_fields() {
        let end = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let mut stats = PlayerStats::new(3, 100, 40, 7);
        stats.cooldown_end = Some(end);

        stats.apply_patch(&StatsPatch {
            gold: Some(12),
            ..StatsPatch::default()
        });
        assert_eq!(stats.level, 3);
        assert_eq!(stats.xp, 100);
        assert_eq!(stats.gold, 12);
        assert_eq!(stats.cooldown_end, Some(end));
    }

    #[test]
    fn test_delta_serializes_camel_case_without_absent_fields() {
        let end = Utc.timestamp_millis_opt(1_700_000_005_000).unwrap();
        let delta = StatsDelta::reward(15, 0).with_cooldown_end(end);
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "xpDelta": 15,
                "goldDelta": 0,
                "cooldownEnd": 1_700_000_005_000i64,
            })
        );

        let level_up = serde_json::to_value(StatsDelta::level_up(2)).unwrap();
        assert_eq!(level_up, serde_json::json!({"level": 2, "resetXp": true}));
    }

    #[test]
    fn test_patch_distinguishes_null_from_missing_cooldown() {
        let cleared: StatsPatch =
            serde_json::from_str(r#"{"level":2,"xp":0,"cooldownEnd":null}"#).unwrap();
        assert_eq!(cleared.cooldown_end, Some(None));

        let untouched: StatsPatch = serde_json::from_str(r#"{"gold":3}"#).unwrap();
        assert_eq!(untouched.cooldown_end, None);
        assert_eq!(untouched.gold, Some(3));
    }

    #[test]
    fn test_patch_accepts_rfc3339_cooldown() {
        let patch: StatsPatch =
            serde_json::from_str(r#"{"cooldownEnd":"2026-01-01T00:00:05Z"}"#).unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 5).unwrap();
        assert_eq!(patch.cooldown_end, Some(Some(expected)));
    }

    #[test]
    fn test_player_stats_parses_server_payload() {
        let stats: PlayerStats = serde_json::from_str(
            r#"{"level":4,"xp":12,"gold":300,"diamonds":9,"cooldownEnd":1700000000000,"username":"ash"}"#,
        )
        .unwrap();
        assert_eq!(stats.level, 4);
        assert_eq!(stats.diamonds, 9);
        assert_eq!(
            stats.cooldown_end,
            Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
        );
    }

    #[test]
    fn test_patch_floors_fractional_xp() {
        let patch: StatsPatch =
            serde_json::from_str(r#"{"level":3,"xp":12.5,"gold":40,"diamonds":1}"#).unwrap();
        assert_eq!(patch.level, Some(3));
        assert_eq!(patch.xp, Some(12));
        assert_eq!(patch.gold, Some(40));

        let whole: StatsPatch = serde_json::from_str(r#"{"xp":12.0}"#).unwrap();
        assert_eq!(whole.xp, Some(12));
        assert_eq!(whole.gold, None);
    }

    #[test]
    fn test_player_stats_accepts_float_counters() {
        let stats: PlayerStats =
            serde_json::from_str(r#"{"level":2,"xp":7.9,"gold":3.0,"diamonds":-1}"#).unwrap();
        assert_eq!(stats.xp, 7);
        assert_eq!(stats.gold, 3);
        assert_eq!(stats.diamonds, 0);
    }

    #[test]
    fn test_clear_cooldown() {
        let mut stats = PlayerStats::new(1, 0, 0, 0);
        stats.cooldown_end = Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
        let mut store = StatsStore::with_stats(stats);

        store.clear_cooldown();
        assert!(store.stats().cooldown_end.is_none());
        assert_eq!(store.revision(), 1);
        store.clear_cooldown();
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_store_revision_tracks_mutations() {
        let mut store = StatsStore::new();
        assert!(!store.is_loaded());
        store.apply(&StatsDelta::reward(1, 1));
        store.overwrite(&StatsPatch::from(&PlayerStats::new(2, 0, 0, 0)));
        assert!(store.is_loaded());
        assert_eq!(store.revision(), 2);
        assert_eq!(store.stats().level, 2);

        store.clear();
        assert!(!store.is_loaded());
        assert_eq!(store.stats(), &PlayerStats::default());
    }

    #[test]
    fn test_empty_delta() {
        assert!(StatsDelta::default().is_empty());
        assert!(!StatsDelta::reward(0, 0).is_empty());
    }
}
