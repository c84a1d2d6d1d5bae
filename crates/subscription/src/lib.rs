//! Reconciles live per-instrument listeners against the desired universe.

mod reconciler;

pub use reconciler::{ListenerSpawner, SubscriptionReconciler};

use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use universe::UniverseRanker;

/// Periodic universe refresh plus reconciliation, until shutdown.
///
/// The first tick fires immediately, so the listener set comes up as soon as
/// the ranking provider answers. A failed refresh keeps the previous
/// universe: a provider outage must not tear down live listeners. Ticks
/// never overlap; a tick that fires mid-reconciliation is delayed.
///
/// On shutdown every listener is cancelled and awaited before this returns.
pub async fn run_subscription_loop(
    ranker: UniverseRanker,
    mut reconciler: SubscriptionReconciler,
    refresh_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(refresh_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = common::cancelled(&mut shutdown_rx) => break,

            _ = ticker.tick() => {
                match ranker.refresh().await {
                    Ok(universe) => {
                        info!(size = universe.len(), "universe refreshed");
                        reconciler.reconcile(&universe);
                    }
                    Err(e) => {
                        warn!(error = %e, "universe refresh failed, keeping current subscriptions");
                    }
                }
            }
        }
    }

    reconciler.shutdown().await;
    info!("subscription loop stopped");
}
