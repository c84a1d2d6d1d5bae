//! Environment-driven runner settings.

use common::FuturesEnvironment;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: FuturesEnvironment,
    pub universe_size: usize,
    pub exclusion_depth: usize,
    pub universe_refresh: Duration,
    pub exclusion_refresh: Duration,
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: FuturesEnvironment::default(),
            universe_size: 100,
            exclusion_depth: 20,
            universe_refresh: Duration::from_secs(3600),
            exclusion_refresh: Duration::from_secs(12 * 3600),
            channel_capacity: 1024,
        }
    }
}

impl Settings {
    /// Read settings from `LIQWATCH_*` variables (and `BINANCE_ENVIRONMENT`),
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            environment: FuturesEnvironment::from_env(),
            universe_size: env_parse("LIQWATCH_UNIVERSE_SIZE", defaults.universe_size),
            exclusion_depth: env_parse("LIQWATCH_EXCLUSION_DEPTH", defaults.exclusion_depth),
            universe_refresh: Duration::from_secs(env_parse(
                "LIQWATCH_UNIVERSE_REFRESH_SECS",
                defaults.universe_refresh.as_secs(),
            )),
            exclusion_refresh: Duration::from_secs(env_parse(
                "LIQWATCH_EXCLUSION_REFRESH_SECS",
                defaults.exclusion_refresh.as_secs(),
            )),
            channel_capacity: env_parse("LIQWATCH_CHANNEL_CAPACITY", defaults.channel_capacity),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
