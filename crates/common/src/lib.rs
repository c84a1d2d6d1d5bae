//! Shared plumbing: reconnect backoff, venue environment, shutdown signal,
//! logging initialization.

mod backoff;
mod environment;
mod shutdown;

pub use backoff::ReconnectBackoff;
pub use environment::{FuturesEnvironment, ParseEnvironmentError};
pub use shutdown::cancelled;

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` when set, otherwise defaults to `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
