//! 24h ticker snapshot from the futures REST API.

use crate::{MarketDataError, TickerStats, VolumeRanking};
use async_trait::async_trait;
use common::FuturesEnvironment;
use rest_client::RestClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw entry of GET /fapi/v1/ticker/24hr.
#[derive(Debug, Deserialize)]
struct Ticker24hRaw {
    symbol: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: Decimal,
}

impl From<Ticker24hRaw> for TickerStats {
    fn from(raw: Ticker24hRaw) -> Self {
        TickerStats {
            symbol: raw.symbol,
            quote_volume: raw.quote_volume,
        }
    }
}

/// Futures 24h ticker client.
pub struct FuturesTickerClient {
    client: RestClient,
}

impl FuturesTickerClient {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(environment: FuturesEnvironment) -> Result<Self, MarketDataError> {
        let client = RestClient::new(environment.rest_base_url(), REQUEST_TIMEOUT)
            .map_err(MarketDataError::Rest)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VolumeRanking for FuturesTickerClient {
    async fn ticker_snapshot(&self) -> Result<Vec<TickerStats>, MarketDataError> {
        let raw: Vec<Ticker24hRaw> = self.client.get("/fapi/v1/ticker/24hr", None).await?;

        tracing::debug!(instruments = raw.len(), "ticker snapshot received");
        Ok(raw.into_iter().map(TickerStats::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_ticker_entry() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "priceChange": "-94.99999800",
            "lastPrice": "4506.35",
            "volume": "188365.05",
            "quoteVolume": "15186568.24",
            "count": 144163
        }"#;

        let raw: Ticker24hRaw = serde_json::from_str(json).unwrap();
        let stats = TickerStats::from(raw);
        assert_eq!(stats.symbol, "BTCUSDT");
        assert_eq!(stats.quote_volume, dec!(15186568.24));
    }

    #[test]
    fn rejects_entry_without_volume() {
        let json = r#"{"symbol": "BTCUSDT"}"#;
        assert!(serde_json::from_str::<Ticker24hRaw>(json).is_err());
    }
}
