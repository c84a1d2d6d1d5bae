use thiserror::Error;

/// Errors surfaced by [`crate::RestClient`] calls.
#[derive(Debug, Error)]
pub enum RestError {
    /// Non-success status from the server, with the response body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The body was not the JSON shape we asked for.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The server asked us to back off.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The client itself could not be constructed.
    #[error("client build failed: {0}")]
    Build(String),
}

impl RestError {
    /// Whether retrying the same call later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RestError::Timeout | RestError::Connect(_) | RestError::RateLimited { .. }
        )
    }
}

impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RestError::Timeout
        } else if err.is_connect() {
            RestError::Connect(err.to_string())
        } else if err.is_decode() {
            RestError::Decode(err.to_string())
        } else {
            RestError::Connect(err.to_string())
        }
    }
}
