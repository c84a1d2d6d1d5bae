use rest_client::RestError;
use thiserror::Error;

/// Errors from the ranking/capitalization providers.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Transport or decode failure on the provider call.
    #[error("provider request failed: {0}")]
    Rest(#[from] RestError),

    /// The payload decoded but did not make sense.
    #[error("malformed provider payload: {0}")]
    Malformed(String),
}
