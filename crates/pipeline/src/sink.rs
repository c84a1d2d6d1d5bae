//! Delivery boundary for filtered notifications.

use async_trait::async_trait;
use model::NotificationRecord;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("notification channel closed")]
    Closed,
}

/// Where surviving records go. Delivery semantics (retries, operator-channel
/// rate limits) live behind this trait, not in the engine.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, record: NotificationRecord) -> Result<(), SinkError>;
}

pub type RecordReceiver = mpsc::Receiver<NotificationRecord>;

/// Sink backed by a bounded in-process channel; the consumer side formats
/// and delivers.
pub struct ChannelSink {
    tx: mpsc::Sender<NotificationRecord>,
}

/// Build a channel sink plus the receiving half.
pub fn channel_sink(capacity: usize) -> (ChannelSink, RecordReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelSink { tx }, rx)
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn send(&self, record: NotificationRecord) -> Result<(), SinkError> {
        self.tx.send(record).await.map_err(|_| SinkError::Closed)
    }
}
