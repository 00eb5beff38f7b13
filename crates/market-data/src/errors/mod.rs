//! Error types for the market data crate.
//!
//! [`MarketDataError`] covers every failure a provider call can surface.
//! Soft provider warnings (rate-limit notes) are never represented here;
//! they are logged and the payload is processed as usual.

use thiserror::Error;

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider answered with a non-success HTTP status.
    #[error("HTTP error: status {status}")]
    Http {
        /// Status code returned by the provider
        status: u16,
    },

    /// The payload carried an explicit `Error Message` from the provider.
    #[error("Provider error: {message}")]
    Provider {
        /// The error message from the provider
        message: String,
    },

    /// The expected data block is absent or empty in an otherwise
    /// successful payload.
    #[error("No data found: {0}")]
    NotFound(String),

    /// The payload could not be decoded at all.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request to the provider timed out.
    #[error("Request timed out")]
    Timeout,

    /// A network error occurred while communicating with the provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Shorthand for a provider-reported error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }
}
