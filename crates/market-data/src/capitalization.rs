//! Capitalization ranking via the CoinGecko markets endpoint.

use crate::{CapitalizationRanking, MarketDataError};
use async_trait::async_trait;
use rest_client::RestClient;
use serde::Deserialize;
use std::time::Duration;

const COINGECKO_BASE_URL: &str = "https://api.coingecko.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The markets endpoint serves at most this many entries per page.
const MAX_PAGE_SIZE: usize = 250;

/// Raw entry of GET /api/v3/coins/markets. Only the base symbol matters.
#[derive(Debug, Deserialize)]
struct MarketEntryRaw {
    symbol: String,
}

/// CoinGecko client for the top-by-market-cap listing.
pub struct CoinGeckoClient {
    client: RestClient,
}

impl CoinGeckoClient {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_base_url(COINGECKO_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, MarketDataError> {
        let client =
            RestClient::new(base_url, REQUEST_TIMEOUT).map_err(MarketDataError::Rest)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CapitalizationRanking for CoinGeckoClient {
    async fn top_by_market_cap(&self, count: usize) -> Result<Vec<String>, MarketDataError> {
        let per_page = count.min(MAX_PAGE_SIZE);
        let query = format!(
            "vs_currency=usd&order=market_cap_desc&per_page={}&page=1",
            per_page
        );

        let entries: Vec<MarketEntryRaw> =
            self.client.get("/api/v3/coins/markets", Some(&query)).await?;

        tracing::debug!(entries = entries.len(), requested = count, "capitalization ranking received");
        Ok(entries
            .into_iter()
            .take(count)
            .map(|e| e.symbol)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_market_entry() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 70187,
            "market_cap": 1381651251183,
            "market_cap_rank": 1
        }"#;

        let raw: MarketEntryRaw = serde_json::from_str(json).unwrap();
        assert_eq!(raw.symbol, "btc");
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(1000usize.min(MAX_PAGE_SIZE), 250);
    }
}
