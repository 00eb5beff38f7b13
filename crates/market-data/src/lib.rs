//! MarketPulse Market Data Crate
//!
//! This crate is the only code that talks to the quote provider. It
//! normalizes provider payloads into plain models and spaces every request
//! through one shared rate limiter.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! | MarketDataClient |  search / quote / intraday / daily / batch / pass-through
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   RateLimiter    |  one global budget (default 12s spacing)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |    Transport     |  HttpTransport (reqwest) or a test double
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  alpha_vantage   |  error checks + field mapping
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - Latest price snapshot for one ticker
//! - [`TimeSeriesPoint`] - One OHLCV bar
//! - [`SearchResult`] - Ranked symbol search hit
//! - [`BatchQuotes`] - Multi-symbol outcome with per-symbol failures
//! - [`MarketDataError`] - Error taxonomy for provider calls

pub mod client;
pub mod errors;
pub mod models;
pub mod provider;
pub mod rate_limit;

pub use client::{MarketDataClient, QuoteSource, DEFAULT_NEWS_LIMIT};
pub use errors::MarketDataError;
pub use models::{
    normalize_symbol, BatchQuotes, IntradayInterval, Quote, SearchResult, SymbolFailure,
    TimeSeriesPoint,
};
pub use provider::{HttpTransport, Transport};
pub use rate_limit::{Clock, ManualClock, RateLimiter, TokioClock, DEFAULT_MIN_INTERVAL};
