//! Provider plumbing.
//!
//! This module contains:
//! - The [`Transport`] seam that issues raw provider requests
//! - [`HttpTransport`], the reqwest implementation used in production
//! - Alpha Vantage request vocabulary and response parsing
//!
//! Nothing outside [`crate::client::MarketDataClient`] talks to a transport,
//! so every request passes through the shared rate limiter.

mod transport;

pub mod alpha_vantage;

pub use transport::{HttpTransport, Transport, DEFAULT_BASE_URL};
