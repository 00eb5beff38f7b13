//! Alpha Vantage API response models.
//!
//! Every field is optional and string-typed, as the provider sends them;
//! conversion into the normalized models happens in the parent module.

use serde::Deserialize;

/// GLOBAL_QUOTE response
#[derive(Debug, Deserialize)]
pub struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    pub global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "05. price")]
    pub price: Option<String>,
    #[serde(rename = "06. volume")]
    pub volume: Option<String>,
    #[serde(rename = "08. previous close")]
    pub previous_close: Option<String>,
    #[serde(rename = "09. change")]
    pub change: Option<String>,
    #[serde(rename = "10. change percent")]
    pub change_percent: Option<String>,
}

impl GlobalQuote {
    /// The provider answers unknown symbols with `"Global Quote": {}`.
    pub fn is_empty(&self) -> bool {
        self.symbol.as_deref().map_or(true, |s| s.trim().is_empty())
    }
}

/// One bar inside a `Time Series (...)` block.
#[derive(Debug, Deserialize)]
pub struct SeriesBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

/// SYMBOL_SEARCH response
#[derive(Debug, Deserialize)]
pub struct SymbolSearchResponse {
    #[serde(rename = "bestMatches", default)]
    pub best_matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
pub struct SearchMatch {
    #[serde(rename = "1. symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "2. name")]
    pub name: Option<String>,
    #[serde(rename = "3. type")]
    pub asset_type: Option<String>,
    #[serde(rename = "4. region")]
    pub region: Option<String>,
    #[serde(rename = "5. marketOpen")]
    pub market_open: Option<String>,
    #[serde(rename = "6. marketClose")]
    pub market_close: Option<String>,
    #[serde(rename = "7. timezone")]
    pub timezone: Option<String>,
    #[serde(rename = "8. currency")]
    pub currency: Option<String>,
    #[serde(rename = "9. matchScore")]
    pub match_score: Option<String>,
}
