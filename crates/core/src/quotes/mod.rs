//! Quote polling.
//!
//! - [`model`] - Poller configuration, lifecycle state and the published snapshot
//! - [`poller`] - The scheduler that keeps a symbol set fresh
//!
//! # Architecture
//!
//! ```text
//! QuotePoller ──tick/refetch──▶ QuoteSource (MarketDataClient) ──▶ RateLimiter
//!      │
//!      └──▶ watch::Sender<PollSnapshot> ──▶ subscribers
//! ```

pub mod model;
pub mod poller;


pub use model::{PollSnapshot, PollerConfig, PollerState, DEFAULT_REFRESH_INTERVAL};
pub use poller::QuotePoller;
