//! Log output for the terminal client.

use crate::game::constants::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber. `filter` uses `EnvFilter` syntax; an invalid
/// filter falls back to the default. Calling this twice is harmless.
pub fn init(filter: &str) {
    let env_filter =
        EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
