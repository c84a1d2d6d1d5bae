mod notifier;
mod settings;

use chrono::Utc;
use config_store::ConfigStore;
use feed_binance::{FeedListenerSpawner, ListenerConfig};
use market_data::{CoinGeckoClient, FuturesTickerClient};
use metrics::create_metrics;
use notifier::{format_notification, DailyCounter};
use pipeline::{channel_sink, EventPipeline};
use settings::Settings;
use std::sync::Arc;
use std::time::Duration;
use subscription::{run_subscription_loop, SubscriptionReconciler};
use tokio::sync::watch;
use tracing::{error, info};
use universe::{
    run_exclusion_loop, ExclusionRefresher, ExclusionState, RankerConfig, UniverseRanker,
};

/// Interval for periodic health status logging.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    common::init_logging();

    let settings = Settings::from_env();
    info!(
        environment = %settings.environment,
        universe_size = settings.universe_size,
        exclusion_depth = settings.exclusion_depth,
        "starting liquidation watch"
    );

    let ticker_client = match FuturesTickerClient::new(settings.environment) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "failed to build ticker client");
            return;
        }
    };
    let caps_client = match CoinGeckoClient::new() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "failed to build capitalization client");
            return;
        }
    };

    let config = ConfigStore::default();
    config.set_exclusion_depth(settings.exclusion_depth);

    let metrics = create_metrics();
    let (sink, mut records) = channel_sink(settings.channel_capacity);
    let pipeline = Arc::new(EventPipeline::new(
        config.clone(),
        Arc::new(sink),
        metrics.clone(),
    ));

    let (shutdown_tx, _) = watch::channel(false);

    // Exclusion refresh runs on its own long timer, decoupled from the
    // universe refresh.
    let exclusions = Arc::new(ExclusionState::new());
    let exclusion_task = tokio::spawn(run_exclusion_loop(
        ExclusionRefresher::new(caps_client, config.clone()),
        exclusions.clone(),
        settings.exclusion_refresh,
        shutdown_tx.subscribe(),
    ));

    let ranker = UniverseRanker::new(
        ticker_client,
        exclusions,
        RankerConfig {
            universe_size: settings.universe_size,
        },
    );
    let spawner = Arc::new(FeedListenerSpawner::new(
        ListenerConfig {
            environment: settings.environment,
            ..ListenerConfig::default()
        },
        pipeline,
        metrics.clone(),
    ));
    let reconciler = SubscriptionReconciler::new(spawner);
    let subscription_task = tokio::spawn(run_subscription_loop(
        ranker,
        reconciler,
        settings.universe_refresh,
        shutdown_tx.subscribe(),
    ));

    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            let _ = ctrl_c_tx.send(true);
        }
    });

    let health_metrics = metrics.clone();
    let mut health_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEALTH_LOG_INTERVAL);
        loop {
            tokio::select! {
                biased;

                _ = common::cancelled(&mut health_shutdown) => break,

                _ = interval.tick() => {
                    let snapshot = health_metrics.snapshot();
                    info!(
                        status = %snapshot.health_status(),
                        listeners = snapshot.active_listeners,
                        liquidations = snapshot.events_received,
                        notified = snapshot.notifications_sent,
                        suppressed = snapshot.events_suppressed,
                        reconnects = snapshot.reconnect_attempts,
                        "health check"
                    );
                }
            }
        }
    });

    // Deliver notifications until shutdown.
    let mut counter = DailyCounter::new(Utc::now().date_naive());
    let mut shutdown_rx = shutdown_tx.subscribe();
    loop {
        tokio::select! {
            biased;

            _ = common::cancelled(&mut shutdown_rx) => break,

            maybe_record = records.recv() => {
                match maybe_record {
                    Some(record) => {
                        let count = counter.bump(&record.symbol, Utc::now().date_naive());
                        println!("{}", format_notification(&record, count));
                    }
                    None => break,
                }
            }
        }
    }

    info!("waiting for listeners to stop");
    let _ = subscription_task.await;
    let _ = exclusion_task.await;

    println!("\n{}", metrics.snapshot());
    info!("shutdown complete");
}
