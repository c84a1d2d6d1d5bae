//! Stateless-per-event filter chain shared by all stream listeners.
//!
//! Order matters: enabled gate, notional computation, threshold, duplicate
//! suppression, formatting. A disabled engine mutates no state, so flipping
//! it back on behaves as if the quiet period never happened.

mod dedup;
mod sink;

pub use dedup::{DedupCache, DedupConfig, DedupKey};
pub use sink::{channel_sink, ChannelSink, NotificationSink, RecordReceiver, SinkError};

use config_store::ConfigStore;
use metrics::SharedMetrics;
use model::{LiquidationEvent, NotificationRecord};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{trace, warn};

/// Why an event produced no notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The engine is switched off.
    Disabled,
    /// Notional overflowed or was not positive.
    InvalidNotional,
    /// Below the configured minimum notional.
    BelowThreshold,
    /// Same event already notified within the dedup window.
    Duplicate,
}

#[derive(Debug)]
pub enum ProcessOutcome {
    Notified(NotificationRecord),
    Suppressed(SuppressReason),
}

impl ProcessOutcome {
    pub fn is_notified(&self) -> bool {
        matches!(self, ProcessOutcome::Notified(_))
    }
}

/// The filter chain. Holds no connection state; one instance is shared by
/// every listener.
pub struct EventPipeline {
    config: ConfigStore,
    dedup: DedupCache,
    sink: Arc<dyn NotificationSink>,
    metrics: SharedMetrics,
}

impl EventPipeline {
    pub fn new(
        config: ConfigStore,
        sink: Arc<dyn NotificationSink>,
        metrics: SharedMetrics,
    ) -> Self {
        Self::with_dedup_config(config, sink, metrics, DedupConfig::default())
    }

    pub fn with_dedup_config(
        config: ConfigStore,
        sink: Arc<dyn NotificationSink>,
        metrics: SharedMetrics,
        dedup: DedupConfig,
    ) -> Self {
        Self {
            config,
            dedup: DedupCache::new(dedup),
            sink,
            metrics,
        }
    }

    /// Run one event through the chain. On success the record is also handed
    /// to the sink; a sink failure is logged but does not fail the event.
    pub async fn process(&self, event: &LiquidationEvent) -> ProcessOutcome {
        // Fresh snapshot per event; never cached across events.
        let config = self.config.snapshot();

        if !config.enabled {
            return self.suppress(event, SuppressReason::Disabled);
        }

        let notional = match event.notional() {
            Some(n) if n > Decimal::ZERO => n,
            _ => return self.suppress(event, SuppressReason::InvalidNotional),
        };

        if notional < config.min_notional {
            return self.suppress(event, SuppressReason::BelowThreshold);
        }

        if !self.dedup.observe(DedupKey::new(event, notional)) {
            return self.suppress(event, SuppressReason::Duplicate);
        }

        let record = NotificationRecord {
            symbol: event.symbol.clone(),
            direction: event.side.liquidated_direction(),
            notional,
            event_time_ms: event.event_time_ms,
            trade_time_ms: event.trade_time_ms,
        };

        self.metrics.inc_notifications_sent();
        if let Err(e) = self.sink.send(record.clone()).await {
            warn!(symbol = %record.symbol, error = %e, "notification dropped by sink");
        }

        ProcessOutcome::Notified(record)
    }

    fn suppress(&self, event: &LiquidationEvent, reason: SuppressReason) -> ProcessOutcome {
        self.metrics.inc_events_suppressed();
        trace!(symbol = %event.symbol, ?reason, "event suppressed");
        ProcessOutcome::Suppressed(reason)
    }
}
