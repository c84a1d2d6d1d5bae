//! Listener state machine: Connecting -> Streaming -> (Reconnecting | Stopped).
//!
//! One connection per instrument isolates failures: a malformed feed or a
//! network blip on one symbol never disrupts the others, and the universe
//! size bounds the number of open connections.

use crate::parser::{parse_event, ParsedEvent};
use crate::FeedError;
use common::{cancelled, FuturesEnvironment, ReconnectBackoff};
use futures_util::{SinkExt, StreamExt};
use metrics::SharedMetrics;
use pipeline::EventPipeline;
use std::sync::Arc;
use std::time::{Duration, Instant};
use subscription::ListenerSpawner;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub environment: FuturesEnvironment,
    /// Give up a connection attempt after this long.
    pub connect_timeout: Duration,
    /// A connection that lived this long resets the reconnect backoff.
    pub stable_threshold: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            environment: FuturesEnvironment::default(),
            connect_timeout: Duration::from_secs(30),
            stable_threshold: Duration::from_secs(300),
        }
    }
}

/// Instrument-scoped liquidation stream endpoint.
pub fn stream_url(environment: FuturesEnvironment, symbol: &str) -> String {
    format!(
        "{}/ws/{}@forceOrder",
        environment.ws_base_url(),
        symbol.to_lowercase()
    )
}

enum ConnectOutcome {
    Connected(WsStream),
    Cancelled,
    Failed(FeedError),
}

async fn connect(
    url: &str,
    connect_timeout: Duration,
    cancel_rx: &mut watch::Receiver<bool>,
) -> ConnectOutcome {
    tokio::select! {
        biased;

        _ = cancelled(cancel_rx) => ConnectOutcome::Cancelled,

        result = tokio::time::timeout(connect_timeout, connect_async(url)) => {
            match result {
                Ok(Ok((stream, _))) => ConnectOutcome::Connected(stream),
                Ok(Err(e)) => ConnectOutcome::Failed(FeedError::WebSocket(e.to_string())),
                Err(_) => ConnectOutcome::Failed(FeedError::ConnectTimeout),
            }
        }
    }
}

enum SessionEnd {
    Cancelled,
    Lost { uptime: Duration, error: FeedError },
}

/// Streaming state: pump frames until the connection dies or we are told to
/// stop. Parse failures are dropped; the connection survives them.
async fn run_session(
    symbol: &str,
    ws: WsStream,
    pipeline: &EventPipeline,
    metrics: &SharedMetrics,
    cancel_rx: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let connected_at = Instant::now();
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            biased;

            _ = cancelled(cancel_rx) => {
                // Best-effort close; the task is going away either way.
                let _ = write.close().await;
                return SessionEnd::Cancelled;
            }

            frame = read.next() => {
                let message = match frame {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        metrics.inc_websocket_errors();
                        return SessionEnd::Lost {
                            uptime: connected_at.elapsed(),
                            error: FeedError::WebSocket(e.to_string()),
                        };
                    }
                    None => {
                        return SessionEnd::Lost {
                            uptime: connected_at.elapsed(),
                            error: FeedError::ConnectionClosed,
                        };
                    }
                };

                match message {
                    Message::Text(text) => {
                        metrics.inc_messages_received();
                        match parse_event(&text) {
                            Ok(ParsedEvent::Liquidation(event)) => {
                                metrics.inc_events_received();
                                pipeline.process(&event).await;
                            }
                            Ok(ParsedEvent::Unknown) => {}
                            Err(e) => {
                                metrics.inc_parse_errors();
                                warn!(symbol = %symbol, error = %e, "dropping unparseable frame");
                            }
                        }
                    }
                    Message::Ping(payload) => {
                        if let Err(e) = write.send(Message::Pong(payload)).await {
                            metrics.inc_websocket_errors();
                            return SessionEnd::Lost {
                                uptime: connected_at.elapsed(),
                                error: FeedError::WebSocket(e.to_string()),
                            };
                        }
                    }
                    Message::Close(_) => {
                        return SessionEnd::Lost {
                            uptime: connected_at.elapsed(),
                            error: FeedError::ConnectionClosed,
                        };
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Run one instrument's listener until cancelled.
///
/// Reconnects with capped exponential backoff on every failure; the backoff
/// resets once a connection proves stable. Cancellation is honored at every
/// suspension point, including mid-connect and mid-backoff. The function
/// returning is the Stopped state: the task is done and never reused.
pub async fn run_listener(
    symbol: String,
    config: ListenerConfig,
    pipeline: Arc<EventPipeline>,
    metrics: SharedMetrics,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let url = stream_url(config.environment, &symbol);
    let mut backoff = ReconnectBackoff::default();
    // True once any connection attempt has happened, so a later success
    // counts as a recovered reconnect.
    let mut reconnecting = false;

    metrics.listener_started();
    info!(symbol = %symbol, "listener starting");

    loop {
        if *cancel_rx.borrow() {
            break;
        }

        match connect(&url, config.connect_timeout, &mut cancel_rx).await {
            ConnectOutcome::Cancelled => break,
            ConnectOutcome::Connected(ws) => {
                if reconnecting {
                    metrics.inc_reconnect_successes();
                }
                reconnecting = true;
                debug!(symbol = %symbol, "connected");

                match run_session(&symbol, ws, &pipeline, &metrics, &mut cancel_rx).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Lost { uptime, error } => {
                        if uptime >= config.stable_threshold {
                            backoff.reset();
                        }
                        metrics.inc_reconnect_attempts();
                        let delay = backoff.next_delay();
                        warn!(
                            symbol = %symbol,
                            error = %error,
                            attempt = backoff.attempt(),
                            delay_secs = delay.as_secs_f64(),
                            "connection lost, reconnecting"
                        );

                        tokio::select! {
                            biased;
                            _ = cancelled(&mut cancel_rx) => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
            ConnectOutcome::Failed(error) => {
                reconnecting = true;
                metrics.inc_reconnect_attempts();
                let delay = backoff.next_delay();
                warn!(
                    symbol = %symbol,
                    error = %error,
                    attempt = backoff.attempt(),
                    delay_secs = delay.as_secs_f64(),
                    "connection failed, retrying"
                );

                tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel_rx) => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    metrics.listener_stopped();
    info!(symbol = %symbol, "listener stopped");
}

/// Production [`ListenerSpawner`]: every listener shares the pipeline and
/// the metrics handle.
pub struct FeedListenerSpawner {
    config: ListenerConfig,
    pipeline: Arc<EventPipeline>,
    metrics: SharedMetrics,
}

impl FeedListenerSpawner {
    pub fn new(
        config: ListenerConfig,
        pipeline: Arc<EventPipeline>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            config,
            pipeline,
            metrics,
        }
    }
}

impl ListenerSpawner for FeedListenerSpawner {
    fn spawn(&self, symbol: &str, cancel_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(run_listener(
            symbol.to_string(),
            self.config.clone(),
            self.pipeline.clone(),
            self.metrics.clone(),
            cancel_rx,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_store::ConfigStore;
    use metrics::create_metrics;
    use pipeline::channel_sink;

    fn test_pipeline() -> (Arc<EventPipeline>, pipeline::RecordReceiver) {
        let (sink, rx) = channel_sink(16);
        let pipeline = Arc::new(EventPipeline::new(
            ConfigStore::default(),
            Arc::new(sink),
            create_metrics(),
        ));
        (pipeline, rx)
    }

    #[test]
    fn stream_url_is_lowercased_and_scoped() {
        assert_eq!(
            stream_url(FuturesEnvironment::Production, "BTCUSDT"),
            "wss://fstream.binance.com/ws/btcusdt@forceOrder"
        );
        assert_eq!(
            stream_url(FuturesEnvironment::Testnet, "ethusdt"),
            "wss://stream.binancefuture.com/ws/ethusdt@forceOrder"
        );
    }

    #[tokio::test]
    async fn pre_cancelled_listener_stops_without_connecting() {
        let metrics = create_metrics();
        let (_cancel_tx, cancel_rx) = watch::channel(true);
        let (pipeline, _records) = test_pipeline();

        tokio::time::timeout(
            Duration::from_secs(1),
            run_listener(
                "BTCUSDT".to_string(),
                ListenerConfig::default(),
                pipeline,
                metrics.clone(),
                cancel_rx,
            ),
        )
        .await
        .expect("listener must stop promptly when already cancelled");

        assert_eq!(metrics.active_listeners(), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_connect() {
        let metrics = create_metrics();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (pipeline, _records) = test_pipeline();

        let task = tokio::spawn(run_listener(
            "BTCUSDT".to_string(),
            ListenerConfig::default(),
            pipeline,
            metrics,
            cancel_rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("cancellation must interrupt a blocked connect")
            .unwrap();
    }
}
