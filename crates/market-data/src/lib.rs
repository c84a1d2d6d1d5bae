//! Ranking and capitalization data providers.
//!
//! The engine consumes these through the [`VolumeRanking`] and
//! [`CapitalizationRanking`] traits; the concrete clients talk to the venue's
//! futures REST API and a market-capitalization aggregator.

mod capitalization;
mod error;
mod ticker;

pub use capitalization::CoinGeckoClient;
pub use error::MarketDataError;
pub use ticker::FuturesTickerClient;

use async_trait::async_trait;
use rust_decimal::Decimal;

/// One instrument's trailing 24h activity.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerStats {
    pub symbol: String,
    pub quote_volume: Decimal,
}

/// Source of the full tradable-instrument snapshot with trailing volumes.
#[async_trait]
pub trait VolumeRanking: Send + Sync {
    /// Current 24h ticker snapshot for all instruments, in the provider's
    /// native order.
    async fn ticker_snapshot(&self) -> Result<Vec<TickerStats>, MarketDataError>;
}

/// Source of the capitalization-ranked instrument list.
#[async_trait]
pub trait CapitalizationRanking: Send + Sync {
    /// Base symbols of the top `count` assets by market capitalization,
    /// highest first.
    async fn top_by_market_cap(&self, count: usize) -> Result<Vec<String>, MarketDataError>;
}
