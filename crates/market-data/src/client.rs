//! Market Data Client - the single gateway to the quote provider.
//!
//! # Architecture
//!
//! ```text
//! caller ──▶ MarketDataClient ──▶ RateLimiter::throttle ──▶ Transport::get
//!                  ▲                                              │
//!                  └──────── alpha_vantage::{decode, parse_*} ◀───┘
//! ```
//!
//! Every operation throttles before its request, so the limiter's spacing
//! guarantee covers all callers and all symbols.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::{
    normalize_symbol, BatchQuotes, IntradayInterval, Quote, SearchResult, SymbolFailure,
    TimeSeriesPoint,
};
use crate::provider::alpha_vantage::{self, Function, DAILY_SERIES_KEY};
use crate::provider::{HttpTransport, Transport};
use crate::rate_limit::RateLimiter;

/// Default `limit` for news queries.
pub const DEFAULT_NEWS_LIMIT: u32 = 50;

/// Anything that can produce a batch of latest quotes.
///
/// The poller depends on this trait rather than on [`MarketDataClient`], so
/// schedulers can be tested against scripted sources.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<BatchQuotes, MarketDataError>;
}

/// Market data client.
///
/// Owns no state beyond the shared [`RateLimiter`] and the transport.
pub struct MarketDataClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
}

impl MarketDataClient {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>) -> Self {
        Self { transport, limiter }
    }

    /// Client against the public Alpha Vantage endpoint.
    pub fn alpha_vantage(api_key: impl Into<String>, limiter: Arc<RateLimiter>) -> Self {
        Self::new(Arc::new(HttpTransport::new(api_key)), limiter)
    }

    /// Throttle, fetch, decode and apply the provider error checks.
    async fn request(&self, params: &[(&str, &str)]) -> Result<Value, MarketDataError> {
        self.limiter.throttle().await;
        let body = self.transport.get(params).await?;
        alpha_vantage::decode(&body)
    }

    /// Search symbols matching `keywords`.
    ///
    /// Never fails: any error is logged and an empty list returned, since
    /// search only feeds autocomplete.
    pub async fn search_symbols(&self, keywords: &str) -> Vec<SearchResult> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Vec::new();
        }

        let result = async {
            let params = [
                ("function", Function::SymbolSearch.as_str()),
                ("keywords", keywords),
            ];
            let value = self.request(&params).await?;
            alpha_vantage::parse_search(value)
        }
        .await;

        match result {
            Ok(results) => {
                debug!("Search '{}' returned {} matches", keywords, results.len());
                results
            }
            Err(e) => {
                error!("Search symbols error for '{}': {}", keywords, e);
                Vec::new()
            }
        }
    }

    /// Latest quote for one symbol.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let symbol = checked_symbol(symbol)?;
        let params = [
            ("function", Function::GlobalQuote.as_str()),
            ("symbol", symbol.as_str()),
        ];

        let value = self.request(&params).await?;
        alpha_vantage::parse_global_quote(value, &symbol)
    }

    /// Intraday bars, ascending by timestamp.
    pub async fn get_intraday(
        &self,
        symbol: &str,
        interval: IntradayInterval,
    ) -> Result<Vec<TimeSeriesPoint>, MarketDataError> {
        let symbol = checked_symbol(symbol)?;
        let params = [
            ("function", Function::TimeSeriesIntraday.as_str()),
            ("symbol", symbol.as_str()),
            ("interval", interval.as_str()),
            ("outputsize", "compact"),
        ];

        let value = self.request(&params).await?;
        let points =
            alpha_vantage::parse_time_series(&value, &alpha_vantage::intraday_series_key(interval))?;

        debug!(
            "Fetched {} intraday ({}) points for {}",
            points.len(),
            interval,
            symbol
        );
        Ok(points)
    }

    /// Daily bars, ascending by timestamp.
    pub async fn get_daily(&self, symbol: &str) -> Result<Vec<TimeSeriesPoint>, MarketDataError> {
        let symbol = checked_symbol(symbol)?;
        let params = [
            ("function", Function::TimeSeriesDaily.as_str()),
            ("symbol", symbol.as_str()),
            ("outputsize", "compact"),
        ];

        let value = self.request(&params).await?;
        let points = alpha_vantage::parse_time_series(&value, DAILY_SERIES_KEY)?;

        debug!("Fetched {} daily points for {}", points.len(), symbol);
        Ok(points)
    }

    /// Quotes for several symbols, fetched one after another.
    ///
    /// A failing symbol is logged, recorded in `failures` and skipped; the
    /// batch itself never fails. Successful quotes keep the input order and
    /// each symbol is requested at most once.
    pub async fn get_multiple_quotes(&self, symbols: &[String]) -> BatchQuotes {
        let mut batch = BatchQuotes::default();
        let mut seen = HashSet::new();

        for raw in symbols {
            let symbol = normalize_symbol(raw);
            if symbol.is_empty() || !seen.insert(symbol.clone()) {
                continue;
            }

            match self.get_quote(&symbol).await {
                Ok(quote) => batch.quotes.push(quote),
                Err(e) => {
                    warn!("Failed to fetch quote for {}: {}", symbol, e);
                    batch.failures.push(SymbolFailure {
                        symbol,
                        reason: e.to_string(),
                    });
                }
            }
        }

        batch
    }

    /// Raw OVERVIEW payload.
    pub async fn get_company_overview(&self, symbol: &str) -> Result<Value, MarketDataError> {
        let symbol = checked_symbol(symbol)?;
        self.request(&[
            ("function", Function::Overview.as_str()),
            ("symbol", symbol.as_str()),
        ])
        .await
    }

    /// Raw NEWS_SENTIMENT payload. `tickers` and `topics` are provider
    /// comma lists and are omitted when `None`; `limit` defaults to
    /// [`DEFAULT_NEWS_LIMIT`].
    pub async fn get_news_and_sentiment(
        &self,
        tickers: Option<&str>,
        topics: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, MarketDataError> {
        let limit = limit.unwrap_or(DEFAULT_NEWS_LIMIT).to_string();
        let mut params = vec![
            ("function", Function::NewsSentiment.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(tickers) = tickers {
            params.push(("tickers", tickers));
        }
        if let Some(topics) = topics {
            params.push(("topics", topics));
        }

        self.request(&params).await
    }

    /// Raw TOP_GAINERS_LOSERS payload.
    pub async fn get_top_gainers_losers(&self) -> Result<Value, MarketDataError> {
        self.request(&[("function", Function::TopGainersLosers.as_str())])
            .await
    }
}

#[async_trait]
impl QuoteSource for MarketDataClient {
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<BatchQuotes, MarketDataError> {
        Ok(self.get_multiple_quotes(symbols).await)
    }
}

fn checked_symbol(symbol: &str) -> Result<String, MarketDataError> {
    let symbol = normalize_symbol(symbol);
    if symbol.is_empty() {
        return Err(MarketDataError::NotFound("Empty symbol".to_string()));
    }
    Ok(symbol)
}
