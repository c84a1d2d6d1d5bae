//! Recent-event record for duplicate suppression.
//!
//! A time-windowed cache with per-key expiry: a key observed again within the
//! window is a duplicate. Bounded in size; overflow evicts the oldest keys
//! rather than clearing everything.

use model::LiquidationEvent;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Identity of an event for duplicate detection. Hashed as a structured
/// tuple, not a formatted string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    symbol: String,
    event_time_ms: i64,
    notional: Decimal,
}

impl DedupKey {
    pub fn new(event: &LiquidationEvent, notional: Decimal) -> Self {
        Self {
            symbol: event.symbol.clone(),
            event_time_ms: event.event_time_ms,
            notional,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// How long a key suppresses re-delivery.
    pub window: Duration,
    /// Upper bound on retained keys.
    pub max_keys: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(120),
            max_keys: 4096,
        }
    }
}

/// Shared by all listeners; a key inserted by one listener is visible to the
/// others as soon as the insert completes.
#[derive(Debug)]
pub struct DedupCache {
    config: DedupConfig,
    seen: Mutex<HashMap<DedupKey, Instant>>,
}

impl DedupCache {
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record `key`. Returns `true` when it is new (or expired), `false`
    /// when it is a duplicate inside the window.
    pub fn observe(&self, key: DedupKey) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock();

        if let Some(at) = seen.get(&key) {
            if now.duration_since(*at) < self.config.window {
                return false;
            }
        }

        seen.insert(key, now);
        if seen.len() > self.config.max_keys {
            Self::shrink(&mut seen, self.config.window, self.config.max_keys, now);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }

    /// Drop expired keys; if that is not enough, drop the oldest survivors
    /// until the cache fits.
    fn shrink(
        seen: &mut HashMap<DedupKey, Instant>,
        window: Duration,
        max_keys: usize,
        now: Instant,
    ) {
        seen.retain(|_, at| now.duration_since(*at) < window);

        if seen.len() > max_keys {
            let mut by_age: Vec<_> = seen.iter().map(|(k, at)| (k.clone(), *at)).collect();
            by_age.sort_by_key(|(_, at)| *at);
            for (key, _) in by_age.into_iter().take(seen.len() - max_keys) {
                seen.remove(&key);
            }
        }
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DedupConfig::default())
    }
}
