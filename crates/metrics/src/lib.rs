use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe counters for the liquidation engine.
#[derive(Debug)]
pub struct EngineMetrics {
    messages_received: AtomicU64,
    events_received: AtomicU64,
    parse_errors: AtomicU64,
    websocket_errors: AtomicU64,
    reconnect_attempts: AtomicU64,
    reconnect_successes: AtomicU64,
    notifications_sent: AtomicU64,
    events_suppressed: AtomicU64,
    active_listeners: AtomicU64,

    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_event_time: Option<Instant>,
    last_error_time: Option<Instant>,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            events_received: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            websocket_errors: AtomicU64::new(0),
            reconnect_attempts: AtomicU64::new(0),
            reconnect_successes: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
            events_suppressed: AtomicU64::new(0),
            active_listeners: AtomicU64::new(0),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_event_time: None,
                last_error_time: None,
            }),
        }
    }

    // --- Increment methods ---

    pub fn inc_messages_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_event_time = Some(Instant::now());
    }

    pub fn inc_parse_errors(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    pub fn inc_websocket_errors(&self) {
        self.websocket_errors.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    pub fn inc_reconnect_attempts(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconnect_successes(&self) {
        self.reconnect_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_suppressed(&self) {
        self.events_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn listener_started(&self) {
        self.active_listeners.fetch_add(1, Ordering::Relaxed);
    }

    pub fn listener_stopped(&self) {
        self.active_listeners.fetch_sub(1, Ordering::Relaxed);
    }

    // --- Getters ---

    pub fn events_received(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn active_listeners(&self) -> u64 {
        self.active_listeners.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_event(&self) -> Option<f64> {
        self.inner
            .read()
            .last_event_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_error(&self) -> Option<f64> {
        self.inner
            .read()
            .last_error_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            events_received: self.events_received(),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            websocket_errors: self.websocket_errors.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            reconnect_successes: self.reconnect_successes.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent(),
            events_suppressed: self.events_suppressed.load(Ordering::Relaxed),
            active_listeners: self.active_listeners(),
            uptime_secs: self.uptime_secs(),
            secs_since_last_event: self.secs_since_last_event(),
            secs_since_last_error: self.secs_since_last_error(),
        }
    }
}

/// A point-in-time copy of all counters.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub events_received: u64,
    pub parse_errors: u64,
    pub websocket_errors: u64,
    pub reconnect_attempts: u64,
    pub reconnect_successes: u64,
    pub notifications_sent: u64,
    pub events_suppressed: u64,
    pub active_listeners: u64,
    pub uptime_secs: f64,
    pub secs_since_last_event: Option<f64>,
    pub secs_since_last_error: Option<f64>,
}

/// Coarse engine health derived from feed staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Degraded => write!(f, "DEGRADED"),
            HealthStatus::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

impl MetricsSnapshot {
    /// Liquidations are sporadic even on a healthy feed; these thresholds are
    /// far looser than a trade-stream monitor would use.
    const STALE_THRESHOLD_SECS: f64 = 900.0;
    const UNHEALTHY_THRESHOLD_SECS: f64 = 3600.0;

    pub fn health_status(&self) -> HealthStatus {
        // With no listeners there is nothing to be healthy about.
        if self.active_listeners == 0 && self.uptime_secs > Self::STALE_THRESHOLD_SECS {
            return HealthStatus::Unhealthy;
        }

        let secs_since_event = match self.secs_since_last_event {
            Some(secs) => secs,
            None => {
                return if self.uptime_secs < Self::STALE_THRESHOLD_SECS {
                    HealthStatus::Healthy
                } else if self.uptime_secs < Self::UNHEALTHY_THRESHOLD_SECS {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Unhealthy
                };
            }
        };

        if secs_since_event > Self::UNHEALTHY_THRESHOLD_SECS {
            HealthStatus::Unhealthy
        } else if secs_since_event > Self::STALE_THRESHOLD_SECS {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Engine Metrics ===")?;
        writeln!(f, "Uptime:              {:.1}s", self.uptime_secs)?;
        writeln!(f, "Active listeners:    {}", self.active_listeners)?;
        writeln!(f, "Messages received:   {}", self.messages_received)?;
        writeln!(f, "Liquidations:        {}", self.events_received)?;
        writeln!(f, "Notified:            {}", self.notifications_sent)?;
        writeln!(f, "Suppressed:          {}", self.events_suppressed)?;
        writeln!(f, "Parse errors:        {}", self.parse_errors)?;
        writeln!(f, "WebSocket errors:    {}", self.websocket_errors)?;
        writeln!(f, "Reconnect attempts:  {}", self.reconnect_attempts)?;
        writeln!(f, "Reconnect successes: {}", self.reconnect_successes)?;
        Ok(())
    }
}

pub type SharedMetrics = Arc<EngineMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(EngineMetrics::new())
}
