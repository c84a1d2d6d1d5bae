//! Reconnect backoff policy for stream listeners.

use rand::Rng;
use std::time::Duration;

/// Capped exponential backoff with proportional jitter.
///
/// Delay for attempt `n` is `min(cap, initial * 2^n)`, nudged by a random
/// jitter of up to `jitter` times the delay in either direction.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    initial: Duration,
    cap: Duration,
    jitter: f64,
    attempt: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 0.1)
    }
}

impl ReconnectBackoff {
    /// A negative `jitter` is treated as no jitter.
    pub fn new(initial: Duration, cap: Duration, jitter: f64) -> Self {
        Self {
            initial,
            cap,
            jitter: jitter.max(0.0),
            attempt: 0,
        }
    }

    /// Delay to sleep before the next attempt. Advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let doubled = self
            .initial
            .saturating_mul(2u32.saturating_pow(self.attempt));
        let capped = doubled.min(self.cap);

        self.attempt = self.attempt.saturating_add(1);

        let spread = capped.as_secs_f64() * self.jitter;
        if spread <= 0.0 {
            return capped;
        }
        let nudge = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_secs_f64((capped.as_secs_f64() + nudge).max(0.0))
    }

    /// Forget accumulated failures; the next delay starts from `initial`
    /// again. Called after a connection has proven stable.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
