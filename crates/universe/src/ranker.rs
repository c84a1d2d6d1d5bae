//! Top-N-by-volume universe computation.

use crate::{ExclusionState, UniverseError};
use market_data::VolumeRanking;
use std::collections::HashSet;
use std::sync::Arc;

/// Quote currency this deployment trades against.
const QUOTE_SUFFIX: &str = "USDT";

#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// How many instruments the universe holds.
    pub universe_size: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self { universe_size: 100 }
    }
}

/// Computes the desired instrument universe from the 24h ticker snapshot.
pub struct UniverseRanker {
    market: Arc<dyn VolumeRanking>,
    exclusions: Arc<ExclusionState>,
    config: RankerConfig,
}

impl UniverseRanker {
    pub fn new(
        market: Arc<dyn VolumeRanking>,
        exclusions: Arc<ExclusionState>,
        config: RankerConfig,
    ) -> Self {
        Self {
            market,
            exclusions,
            config,
        }
    }

    /// Fetch, filter and rank: USDT-quoted instruments not in the exclusion
    /// set, by trailing quote volume descending, cut to the configured size.
    ///
    /// # Errors
    /// `DataUnavailable` when the provider call fails; the caller must keep
    /// its previous universe in that case.
    pub async fn refresh(&self) -> Result<HashSet<String>, UniverseError> {
        let snapshot = self.market.ticker_snapshot().await?;

        let mut eligible: Vec<_> = snapshot
            .into_iter()
            .filter(|t| t.symbol.ends_with(QUOTE_SUFFIX))
            .filter(|t| !self.exclusions.contains(&t.symbol))
            .collect();

        // Stable sort: ties keep the provider's native order.
        eligible.sort_by(|a, b| b.quote_volume.cmp(&a.quote_volume));

        Ok(eligible
            .into_iter()
            .take(self.config.universe_size)
            .map(|t| t.symbol)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_data::{MarketDataError, TickerStats};
    use rust_decimal_macros::dec;

    struct FixedRanking(Vec<TickerStats>);

    #[async_trait]
    impl VolumeRanking for FixedRanking {
        async fn ticker_snapshot(&self) -> Result<Vec<TickerStats>, MarketDataError> {
            Ok(self.0.clone())
        }
    }

    struct FailingRanking;

    #[async_trait]
    impl VolumeRanking for FailingRanking {
        async fn ticker_snapshot(&self) -> Result<Vec<TickerStats>, MarketDataError> {
            Err(MarketDataError::Malformed("truncated body".to_string()))
        }
    }

    fn stats(symbol: &str, volume: rust_decimal::Decimal) -> TickerStats {
        TickerStats {
            symbol: symbol.to_string(),
            quote_volume: volume,
        }
    }

    fn ranker(
        tickers: Vec<TickerStats>,
        exclusions: Arc<ExclusionState>,
        size: usize,
    ) -> UniverseRanker {
        UniverseRanker::new(
            Arc::new(FixedRanking(tickers)),
            exclusions,
            RankerConfig {
                universe_size: size,
            },
        )
    }

    #[tokio::test]
    async fn keeps_top_n_usdt_symbols_by_volume() {
        let tickers = vec![
            stats("AAAUSDT", dec!(100)),
            stats("BBBUSDT", dec!(900)),
            stats("CCCBTC", dec!(5000)),
            stats("DDDUSDT", dec!(500)),
        ];
        let universe = ranker(tickers, Arc::new(ExclusionState::new()), 2)
            .refresh()
            .await
            .unwrap();

        assert_eq!(
            universe,
            HashSet::from(["BBBUSDT".to_string(), "DDDUSDT".to_string()])
        );
    }

    #[tokio::test]
    async fn excluded_symbols_never_rank() {
        let exclusions = Arc::new(ExclusionState::new());
        exclusions.replace(HashSet::from(["BTCUSDT".to_string()]));

        let tickers = vec![
            stats("BTCUSDT", dec!(1000000)),
            stats("ETHUSDT", dec!(500)),
        ];
        let universe = ranker(tickers, exclusions, 10).refresh().await.unwrap();

        assert!(!universe.contains("BTCUSDT"));
        assert!(universe.contains("ETHUSDT"));
    }

    #[tokio::test]
    async fn cleared_exclusions_rank_again() {
        let exclusions = Arc::new(ExclusionState::new());
        exclusions.replace(HashSet::from(["BTCUSDT".to_string()]));

        let tickers = vec![
            stats("BTCUSDT", dec!(1000000)),
            stats("ETHUSDT", dec!(500)),
        ];
        let ranker = ranker(tickers, exclusions.clone(), 10);

        assert!(!ranker.refresh().await.unwrap().contains("BTCUSDT"));

        // Depth dropped to zero: exclusion set rebuilt empty.
        exclusions.replace(HashSet::new());
        assert!(ranker.refresh().await.unwrap().contains("BTCUSDT"));
    }

    #[tokio::test]
    async fn provider_failure_is_data_unavailable() {
        let ranker = UniverseRanker::new(
            Arc::new(FailingRanking),
            Arc::new(ExclusionState::new()),
            RankerConfig::default(),
        );

        let err = ranker.refresh().await.unwrap_err();
        assert!(matches!(err, UniverseError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn smaller_snapshot_than_universe_size_is_fine() {
        let tickers = vec![stats("AAAUSDT", dec!(1))];
        let universe = ranker(tickers, Arc::new(ExclusionState::new()), 100)
            .refresh()
            .await
            .unwrap();
        assert_eq!(universe.len(), 1);
    }
}
