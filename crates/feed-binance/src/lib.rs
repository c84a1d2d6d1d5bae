//! Per-instrument forced-liquidation stream listener.

mod listener;
mod parser;

pub use listener::{run_listener, stream_url, FeedListenerSpawner, ListenerConfig};
pub use parser::{parse_event, ParsedEvent};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("connection closed by server")]
    ConnectionClosed,

    #[error("connection attempt timed out")]
    ConnectTimeout,
}
