//! Market data models
//!
//! This module contains the normalized data types handed to collaborators:
//! - `quote` - Latest price snapshot for one ticker (Quote)
//! - `series` - OHLCV bars and intraday bar widths (TimeSeriesPoint, IntradayInterval)
//! - `search` - Symbol search results (SearchResult)
//! - `batch` - Multi-symbol fetch outcome with per-symbol failures (BatchQuotes)

mod batch;
mod quote;
mod search;
mod series;

pub use batch::{BatchQuotes, SymbolFailure};
pub use quote::{normalize_symbol, Quote};
pub use search::{rank_by_match_score, SearchResult};
pub use series::{IntradayInterval, TimeSeriesPoint};
