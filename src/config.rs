//! Client settings: ~/.pixmon/config.json with environment overrides.

use crate::game::constants::*;
use crate::utils::persistence::Storage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_API_URL: &str = "PIXMON_API_URL";
pub const ENV_LOG: &str = "PIXMON_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// 0 disables the periodic stats refresh.
    pub refresh_interval_secs: u64,
    pub cooldown_tick_ms: u64,
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: HTTP_TIMEOUT_SECONDS,
            refresh_interval_secs: STATS_REFRESH_INTERVAL_SECONDS,
            cooldown_tick_ms: COOLDOWN_TICK_MS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads the config file (defaults if missing or invalid), then applies
    /// environment overrides.
    pub fn load(storage: &Storage) -> Self {
        let config: Self = storage.load_json_or_default(CONFIG_FILE);
        config
            .with_overrides(|key| std::env::var(key).ok())
            .normalized()
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
        self
    }

    pub fn normalized(mut self) -> Self {
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self.cooldown_tick_ms = self
            .cooldown_tick_ms
            .clamp(COOLDOWN_TICK_MIN_MS, COOLDOWN_TICK_MS);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cooldown_tick(&self) -> Duration {
        Duration::from_millis(self.cooldown_tick_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn save(&self, storage: &Storage) -> std::io::Result<()> {
        storage.save_json(CONFIG_FILE, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.cooldown_tick(), Duration::from_millis(250));
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_base_url":"https://pixmon.example/api/"}"#).unwrap();
        let config = config.normalized();
        assert_eq!(config.api_base_url, "https://pixmon.example/api");
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::default().with_overrides(|key| match key {
            ENV_API_URL => Some("http://10.0.0.2:8080".to_string()),
            ENV_LOG => Some("pixmon=debug".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://10.0.0.2:8080");
        assert_eq!(config.log_filter, "pixmon=debug");
    }

    #[test]
    fn test_blank_override_ignored() {
        let config = ClientConfig::default().with_overrides(|_| Some("  ".to_string()));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_tick_clamped_and_refresh_disabled() {
        let config = ClientConfig {
            cooldown_tick_ms: 5_000,
            refresh_interval_secs: 0,
            ..ClientConfig::default()
        }
        .normalized();
        assert_eq!(config.cooldown_tick_ms, 250);
        assert_eq!(config.refresh_interval(), None);

        let fast = ClientConfig {
            cooldown_tick_ms: 1,
            ..ClientConfig::default()
        }
        .normalized();
        assert_eq!(fast.cooldown_tick_ms, 50);
    }

    #[test]
    fn test_save_and_load_from_storage() {
        let storage = Storage::new_for_test().unwrap();
        let config = ClientConfig {
            refresh_interval_secs: 90,
            ..ClientConfig::default()
        };
        config.save(&storage).unwrap();

        let loaded: ClientConfig = storage.load_json_or_default(CONFIG_FILE);
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(storage.dir()).ok();
    }
}
