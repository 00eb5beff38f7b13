//! Search result models for symbol lookup.

use serde::{Deserialize, Serialize};

/// Result from a ticker/symbol search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Symbol/ticker (e.g., "AAPL", "TSCO.LON")
    pub symbol: String,

    /// Display name (e.g., "Apple Inc")
    pub name: String,

    /// Instrument type (e.g., "Equity", "ETF")
    #[serde(rename = "type")]
    pub asset_type: String,

    /// Market region (e.g., "United States")
    pub region: String,

    /// Local market open time, "HH:MM"
    pub market_open: String,

    /// Local market close time, "HH:MM"
    pub market_close: String,

    /// Market time zone (e.g., "UTC-04")
    pub timezone: String,

    /// Trading currency (e.g., "USD")
    pub currency: String,

    /// Relevance score from provider (higher = better match)
    pub match_score: f64,
}

/// Sorts search results by descending match score, keeping provider order
/// among equal scores.
pub fn rank_by_match_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
}
