//! MarketPulse Core - quote polling and chart rendering.
//!
//! This crate consumes the normalized models of `marketpulse-market-data`.
//! It never talks to the provider itself: the poller goes through a
//! [`QuoteSource`](marketpulse_market_data::QuoteSource) and the chart
//! pipeline works on series handed to it.

pub mod charts;
pub mod errors;
pub mod quotes;

// Re-export error types
pub use errors::ChartError;
pub use errors::Result;

pub use charts::{ChartRenderer, ChartTheme, ChartWindow, DegradedReason, TimeFrame};
pub use quotes::{PollSnapshot, PollerConfig, PollerState, QuotePoller};
