//! Capitalization-based exclusion set, rebuilt on its own timer.

use crate::UniverseError;
use config_store::ConfigStore;
use market_data::CapitalizationRanking;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Suffix mapping a capitalization base symbol onto the venue's instrument
/// naming. Venues with several quote currencies per base would need a real
/// mapping table instead.
const QUOTE_SUFFIX: &str = "USDT";

/// Shared, wholesale-replaced exclusion set.
#[derive(Debug, Default)]
pub struct ExclusionState {
    symbols: RwLock<HashSet<String>>,
}

impl ExclusionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.read().contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.read().is_empty()
    }

    /// Swap in a freshly computed set.
    pub fn replace(&self, symbols: HashSet<String>) {
        *self.symbols.write() = symbols;
    }
}

/// Maps a capitalization-ranking base symbol to feed naming.
fn to_feed_symbol(base: &str) -> String {
    format!("{}{}", base.trim().to_uppercase(), QUOTE_SUFFIX)
}

/// Recomputes the exclusion set from the capitalization ranking.
pub struct ExclusionRefresher {
    provider: Arc<dyn CapitalizationRanking>,
    config: ConfigStore,
}

impl ExclusionRefresher {
    pub fn new(provider: Arc<dyn CapitalizationRanking>, config: ConfigStore) -> Self {
        Self { provider, config }
    }

    /// Compute the exclusion set for the current depth. Depth zero yields an
    /// empty set without touching the provider.
    ///
    /// # Errors
    /// `DataUnavailable` when the provider call fails; the caller keeps the
    /// previous set.
    pub async fn refresh(&self) -> Result<HashSet<String>, UniverseError> {
        let depth = self.config.snapshot().exclusion_depth;
        if depth == 0 {
            return Ok(HashSet::new());
        }

        let bases = self.provider.top_by_market_cap(depth).await?;
        Ok(bases.iter().map(|b| to_feed_symbol(b)).collect())
    }
}

/// Periodic exclusion refresh. Applies each successful refresh to `state`;
/// failures keep the previous set. Runs until shutdown.
pub async fn run_exclusion_loop(
    refresher: ExclusionRefresher,
    state: Arc<ExclusionState>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = common::cancelled(&mut shutdown_rx) => {
                info!("exclusion refresh stopped");
                return;
            }

            _ = ticker.tick() => {
                match refresher.refresh().await {
                    Ok(symbols) => {
                        info!(excluded = symbols.len(), "exclusion set rebuilt");
                        state.replace(symbols);
                    }
                    Err(e) => {
                        warn!(error = %e, "exclusion refresh failed, keeping previous set");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_data::MarketDataError;

    struct FixedCaps(Vec<String>);

    #[async_trait]
    impl CapitalizationRanking for FixedCaps {
        async fn top_by_market_cap(
            &self,
            count: usize,
        ) -> Result<Vec<String>, MarketDataError> {
            Ok(self.0.iter().take(count).cloned().collect())
        }
    }

    /// Fails every call; also trips the test if depth 0 reaches it.
    struct FailingCaps;

    #[async_trait]
    impl CapitalizationRanking for FailingCaps {
        async fn top_by_market_cap(
            &self,
            _count: usize,
        ) -> Result<Vec<String>, MarketDataError> {
            Err(MarketDataError::Malformed("no entries".to_string()))
        }
    }

    #[test]
    fn feed_symbol_mapping_uppercases_and_suffixes() {
        assert_eq!(to_feed_symbol("btc"), "BTCUSDT");
        assert_eq!(to_feed_symbol(" eth "), "ETHUSDT");
    }

    #[test]
    fn state_replace_is_wholesale() {
        let state = ExclusionState::new();
        state.replace(HashSet::from(["BTCUSDT".to_string(), "ETHUSDT".to_string()]));
        assert_eq!(state.len(), 2);

        state.replace(HashSet::from(["SOLUSDT".to_string()]));
        assert!(state.contains("SOLUSDT"));
        assert!(!state.contains("BTCUSDT"));
    }

    #[tokio::test]
    async fn refresh_maps_top_k_to_feed_naming() {
        let provider = Arc::new(FixedCaps(vec![
            "btc".to_string(),
            "eth".to_string(),
            "sol".to_string(),
        ]));
        let config = ConfigStore::default();
        config.set_exclusion_depth(2);

        let set = ExclusionRefresher::new(provider, config)
            .refresh()
            .await
            .unwrap();
        assert_eq!(
            set,
            HashSet::from(["BTCUSDT".to_string(), "ETHUSDT".to_string()])
        );
    }

    #[tokio::test]
    async fn depth_zero_skips_the_provider() {
        let config = ConfigStore::default();
        config.set_exclusion_depth(0);

        let set = ExclusionRefresher::new(Arc::new(FailingCaps), config)
            .refresh()
            .await
            .unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn loop_retains_previous_set_on_failure() {
        let state = Arc::new(ExclusionState::new());
        state.replace(HashSet::from(["BTCUSDT".to_string()]));

        let config = ConfigStore::default();
        let refresher = ExclusionRefresher::new(Arc::new(FailingCaps), config);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_exclusion_loop(
            refresher,
            state.clone(),
            Duration::from_millis(10),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        assert!(state.contains("BTCUSDT"));
    }
}
