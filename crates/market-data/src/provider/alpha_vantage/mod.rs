//! Alpha Vantage request vocabulary and response parsing.
//!
//! This module turns raw provider payloads into normalized models:
//! - GLOBAL_QUOTE into [`Quote`]
//! - TIME_SERIES_INTRADAY / TIME_SERIES_DAILY into ascending [`TimeSeriesPoint`] lists
//! - SYMBOL_SEARCH into ranked [`SearchResult`] lists
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute, and
//! reports throttling in-band through `Note` / `Information` fields.

mod models;

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::{
    normalize_symbol, rank_by_match_score, IntradayInterval, Quote, SearchResult,
    TimeSeriesPoint,
};

use models::{GlobalQuoteResponse, SearchMatch, SeriesBar, SymbolSearchResponse};

/// Block key of the daily series.
pub const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

/// Provider endpoints, sent as the `function` query parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Function {
    SymbolSearch,
    GlobalQuote,
    TimeSeriesIntraday,
    TimeSeriesDaily,
    Overview,
    NewsSentiment,
    TopGainersLosers,
}

impl Function {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SymbolSearch => "SYMBOL_SEARCH",
            Self::GlobalQuote => "GLOBAL_QUOTE",
            Self::TimeSeriesIntraday => "TIME_SERIES_INTRADAY",
            Self::TimeSeriesDaily => "TIME_SERIES_DAILY",
            Self::Overview => "OVERVIEW",
            Self::NewsSentiment => "NEWS_SENTIMENT",
            Self::TopGainersLosers => "TOP_GAINERS_LOSERS",
        }
    }
}

/// Block key of an intraday series, e.g. `"Time Series (5min)"`.
pub fn intraday_series_key(interval: IntradayInterval) -> String {
    format!("Time Series ({})", interval.as_str())
}

/// Decode a response body and apply the provider's in-band error signaling.
pub fn decode(body: &str) -> Result<Value, MarketDataError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        MarketDataError::InvalidResponse(format!("Failed to parse response: {}", e))
    })?;

    check_api_error(&value)?;
    Ok(value)
}

/// `Error Message` is a hard failure. `Note` and `Information` are soft
/// warnings: logged, never raised.
pub fn check_api_error(value: &Value) -> Result<(), MarketDataError> {
    if let Some(message) = value.get("Error Message") {
        return Err(MarketDataError::provider(field_text(message)));
    }

    if let Some(note) = value.get("Note") {
        let note = field_text(note);
        warn!("Alpha Vantage note: {}", note);
        if is_rate_limit_message(&note) {
            warn!("Alpha Vantage rate limit hit, continuing with available data");
        }
    }

    if let Some(information) = value.get("Information") {
        warn!("Alpha Vantage info: {}", field_text(information));
    }

    Ok(())
}

fn field_text(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("call frequency")
}

/// Parse a GLOBAL_QUOTE payload.
pub fn parse_global_quote(value: Value, symbol: &str) -> Result<Quote, MarketDataError> {
    let response = GlobalQuoteResponse::deserialize(value).map_err(|e| {
        MarketDataError::InvalidResponse(format!("Failed to parse quote response: {}", e))
    })?;

    let raw = response
        .global_quote
        .filter(|q| !q.is_empty())
        .ok_or_else(|| MarketDataError::NotFound(format!("No quote data for symbol: {}", symbol)))?;

    let price = required_decimal(raw.price.as_deref(), "05. price", symbol)?;
    if price.is_sign_negative() {
        return Err(MarketDataError::InvalidResponse(format!(
            "Negative price {} for symbol: {}",
            price, symbol
        )));
    }

    let change_percent = raw
        .change_percent
        .as_deref()
        .map(|s| s.trim().trim_end_matches('%'));

    Ok(Quote {
        symbol: normalize_symbol(raw.symbol.as_deref().unwrap_or(symbol)),
        price,
        change: required_decimal(raw.change.as_deref(), "09. change", symbol)?,
        change_percent: required_decimal(change_percent, "10. change percent", symbol)?,
        volume: parse_volume(raw.volume.as_deref()).ok_or_else(|| {
            MarketDataError::InvalidResponse(format!("Invalid volume for symbol: {}", symbol))
        })?,
        previous_close: required_decimal(
            raw.previous_close.as_deref(),
            "08. previous close",
            symbol,
        )?,
    })
}

/// Parse the series block under `series_key` into an ascending,
/// duplicate-free list of points.
///
/// Timestamps are read in the zone reported by `Meta Data` and converted to
/// UTC. Entries that fail to parse are skipped.
pub fn parse_time_series(
    value: &Value,
    series_key: &str,
) -> Result<Vec<TimeSeriesPoint>, MarketDataError> {
    let block = value
        .get(series_key)
        .and_then(Value::as_object)
        .ok_or_else(|| MarketDataError::NotFound(format!("Missing \"{}\" block", series_key)))?;

    let tz = series_time_zone(value);

    let mut points: Vec<TimeSeriesPoint> = block
        .iter()
        .filter_map(|(stamp, raw)| {
            let point = SeriesBar::deserialize(raw)
                .ok()
                .and_then(|bar| to_point(stamp, &bar, tz));
            if point.is_none() {
                debug!("Alpha Vantage: skipping unparseable bar at {}", stamp);
            }
            point
        })
        .collect();

    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    points.dedup_by_key(|p| p.timestamp);

    Ok(points)
}

/// Parse a SYMBOL_SEARCH payload, ranked by descending match score.
pub fn parse_search(value: Value) -> Result<Vec<SearchResult>, MarketDataError> {
    let response = SymbolSearchResponse::deserialize(value).map_err(|e| {
        MarketDataError::InvalidResponse(format!("Failed to parse search response: {}", e))
    })?;

    let mut results: Vec<SearchResult> = response
        .best_matches
        .into_iter()
        .map(to_search_result)
        .collect();

    rank_by_match_score(&mut results);
    Ok(results)
}

fn to_search_result(m: SearchMatch) -> SearchResult {
    fn or(value: Option<String>, default: &str) -> String {
        value.unwrap_or_else(|| default.to_string())
    }

    SearchResult {
        symbol: or(m.symbol, ""),
        name: or(m.name, ""),
        asset_type: or(m.asset_type, "Equity"),
        region: or(m.region, "United States"),
        market_open: or(m.market_open, "09:30"),
        market_close: or(m.market_close, "16:00"),
        timezone: or(m.timezone, "UTC-04"),
        currency: or(m.currency, "USD"),
        match_score: m
            .match_score
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0),
    }
}

fn series_time_zone(value: &Value) -> Tz {
    value
        .get("Meta Data")
        .and_then(Value::as_object)
        .and_then(|meta| meta.iter().find(|(key, _)| key.ends_with("Time Zone")))
        .and_then(|(_, zone)| zone.as_str())
        .and_then(|zone| zone.trim().parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

fn to_point(stamp: &str, bar: &SeriesBar, tz: Tz) -> Option<TimeSeriesPoint> {
    Some(TimeSeriesPoint {
        timestamp: parse_timestamp(stamp, tz)?,
        open: parse_decimal(&bar.open)?,
        high: parse_decimal(&bar.high)?,
        low: parse_decimal(&bar.low)?,
        close: parse_decimal(&bar.close)?,
        volume: parse_volume(Some(&bar.volume))?,
    })
}

/// Parse `"2024-01-15 16:00:00"` or `"2024-01-15"` as local time in `tz`.
fn parse_timestamp(stamp: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let stamp = stamp.trim();
    let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(stamp, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok()
}

fn parse_volume(s: Option<&str>) -> Option<u64> {
    let s = s?.trim();
    s.parse::<u64>()
        .ok()
        .or_else(|| parse_decimal(s).and_then(|d| d.trunc().to_u64()))
}

fn required_decimal(
    raw: Option<&str>,
    field: &str,
    symbol: &str,
) -> Result<Decimal, MarketDataError> {
    let raw = raw.ok_or_else(|| {
        MarketDataError::NotFound(format!("Missing \"{}\" for symbol: {}", field, symbol))
    })?;

    parse_decimal(raw).ok_or_else(|| {
        MarketDataError::InvalidResponse(format!(
            "Invalid \"{}\" value '{}' for symbol: {}",
            field, raw, symbol
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_global_quote() {
        let value = json!({
            "Global Quote": {
                "01. symbol": "TEST",
                "05. price": "100.00",
                "06. volume": "1000",
                "08. previous close": "98.50",
                "09. change": "1.50",
                "10. change percent": "1.52%"
            }
        });

        let quote = parse_global_quote(value, "TEST").unwrap();
        assert_eq!(quote.symbol, "TEST");
        assert_eq!(quote.price, dec!(100.00));
        assert_eq!(quote.change, dec!(1.50));
        assert_eq!(quote.change_percent, dec!(1.52));
        assert_eq!(quote.volume, 1000);
        assert_eq!(quote.previous_close, dec!(98.50));
    }

    #[test]
    fn test_parse_global_quote_negative_change_percent() {
        let value = json!({
            "Global Quote": {
                "01. symbol": "ibm",
                "05. price": "150.25",
                "06. volume": "2500000",
                "08. previous close": "152.75",
                "09. change": "-2.5000",
                "10. change percent": "-1.6367%"
            }
        });

        let quote = parse_global_quote(value, "IBM").unwrap();
        assert_eq!(quote.symbol, "IBM");
        assert_eq!(quote.change, dec!(-2.5));
        assert_eq!(quote.change_percent, dec!(-1.6367));
    }

    #[test]
    fn test_parse_global_quote_empty_block_is_not_found() {
        let value = json!({ "Global Quote": {} });
        assert!(matches!(
            parse_global_quote(value, "NOPE"),
            Err(MarketDataError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_global_quote_missing_block_is_not_found() {
        let value = json!({ "Information": "demo key" });
        assert!(matches!(
            parse_global_quote(value, "NOPE"),
            Err(MarketDataError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_global_quote_invalid_price() {
        let value = json!({
            "Global Quote": {
                "01. symbol": "TEST",
                "05. price": "abc",
                "06. volume": "1",
                "08. previous close": "1",
                "09. change": "0",
                "10. change percent": "0%"
            }
        });
        assert!(matches!(
            parse_global_quote(value, "TEST"),
            Err(MarketDataError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_check_api_error_message_is_fatal() {
        let value = json!({ "Error Message": "Invalid API call." });
        match check_api_error(&value) {
            Err(MarketDataError::Provider { message }) => assert_eq!(message, "Invalid API call."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_check_api_error_note_is_soft() {
        let value = json!({
            "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."
        });
        assert!(check_api_error(&value).is_ok());
        assert!(is_rate_limit_message(
            value["Note"].as_str().unwrap()
        ));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode("<html>busy</html>"),
            Err(MarketDataError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_daily_series_sorted_ascending() {
        let value = json!({
            "Meta Data": { "5. Time Zone": "US/Eastern" },
            "Time Series (Daily)": {
                "2024-01-17": { "1. open": "3", "2. high": "3", "3. low": "3", "4. close": "3", "5. volume": "300" },
                "2024-01-15": { "1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "100" },
                "2024-01-16": { "1. open": "2", "2. high": "2", "3. low": "2", "4. close": "2", "5. volume": "200" }
            }
        });

        let points = parse_time_series(&value, DAILY_SERIES_KEY).unwrap();
        let closes: Vec<Decimal> = points.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![dec!(1), dec!(2), dec!(3)]);
        // Midnight in New York is 05:00 UTC in January
        assert_eq!(points[0].timestamp.to_rfc3339(), "2024-01-15T05:00:00+00:00");
    }

    #[test]
    fn test_parse_intraday_series_without_meta_uses_utc() {
        let key = intraday_series_key(IntradayInterval::FiveMinutes);
        let value = json!({
            "Time Series (5min)": {
                "2024-01-15 16:00:00": { "1. open": "10", "2. high": "11", "3. low": "9", "4. close": "10.5", "5. volume": "42" },
                "2024-01-15 15:55:00": { "1. open": "9", "2. high": "10", "3. low": "8", "4. close": "9.5", "5. volume": "7" }
            }
        });

        let points = parse_time_series(&value, &key).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp.to_rfc3339(), "2024-01-15T15:55:00+00:00");
        assert_eq!(points[1].volume, 42);
    }

    #[test]
    fn test_parse_series_skips_bad_entries() {
        let value = json!({
            "Time Series (Daily)": {
                "not-a-date": { "1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1" },
                "2024-01-15": { "1. open": "x", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1" },
                "2024-01-16": { "1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1" }
            }
        });

        let points = parse_time_series(&value, DAILY_SERIES_KEY).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_parse_series_missing_key_is_not_found() {
        let value = json!({ "Time Series (Daily)": {} });
        let key = intraday_series_key(IntradayInterval::OneMinute);
        assert!(matches!(
            parse_time_series(&value, &key),
            Err(MarketDataError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_search_defaults_and_ranking() {
        let value = json!({
            "bestMatches": [
                { "1. symbol": "TSCO.LON", "2. name": "Tesco PLC", "9. matchScore": "0.7273" },
                {
                    "1. symbol": "TSLA",
                    "2. name": "Tesla Inc",
                    "3. type": "Equity",
                    "4. region": "United States",
                    "5. marketOpen": "09:30",
                    "6. marketClose": "16:00",
                    "7. timezone": "UTC-04",
                    "8. currency": "USD",
                    "9. matchScore": "0.8889"
                }
            ]
        });

        let results = parse_search(value).unwrap();
        assert_eq!(results[0].symbol, "TSLA");
        assert_eq!(results[1].symbol, "TSCO.LON");
        assert_eq!(results[1].currency, "USD");
        assert_eq!(results[1].market_open, "09:30");
        assert!((results[1].match_score - 0.7273).abs() < 1e-9);
    }

    #[test]
    fn test_parse_search_without_matches() {
        assert!(parse_search(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume(Some("1000")), Some(1000));
        assert_eq!(parse_volume(Some("1000.7")), Some(1000));
        assert_eq!(parse_volume(Some("-5")), None);
        assert_eq!(parse_volume(None), None);
    }

    #[test]
    fn test_function_names() {
        assert_eq!(Function::GlobalQuote.as_str(), "GLOBAL_QUOTE");
        assert_eq!(Function::TopGainersLosers.as_str(), "TOP_GAINERS_LOSERS");
        assert_eq!(
            intraday_series_key(IntradayInterval::SixtyMinutes),
            "Time Series (60min)"
        );
    }
}
