//! Thin read-only REST client shared by the market data providers.

mod client;
mod error;

pub use client::RestClient;
pub use error::RestError;
