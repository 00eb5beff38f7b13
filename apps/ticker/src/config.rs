//! Environment configuration for the ticker binary.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use marketpulse_core::{ChartTheme, TimeFrame};
use marketpulse_market_data::{normalize_symbol, DEFAULT_MIN_INTERVAL};
use tracing::warn;

const DEFAULT_API_KEY: &str = "demo";
const DEFAULT_SYMBOLS: &[&str] = &["AAPL", "MSFT", "GOOGL"];
const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;
const DEFAULT_CHART_WIDTH: u32 = 800;
const DEFAULT_CHART_HEIGHT: u32 = 280;
const DEFAULT_CHART_OUT: &str = "chart.ppm";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    /// Provider endpoint override (proxies, test servers)
    pub base_url: Option<String>,
    pub symbols: Vec<String>,
    pub refresh_interval: Duration,
    pub rate_limit: Duration,
    pub chart_symbol: String,
    pub chart_timeframe: TimeFrame,
    pub chart_width: u32,
    pub chart_height: u32,
    pub chart_out: PathBuf,
    pub theme: ChartTheme,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values take defaults,
    /// unparseable ones take defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let symbols = get("MP_SYMBOLS")
            .map(|raw| parse_symbols(&raw))
            .filter(|symbols| !symbols.is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect());

        let chart_symbol = get("MP_CHART_SYMBOL")
            .map(|symbol| normalize_symbol(&symbol))
            .or_else(|| symbols.first().cloned())
            .unwrap_or_else(|| DEFAULT_SYMBOLS[0].to_string());

        Self {
            api_key: get("MP_ALPHA_VANTAGE_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            base_url: get("MP_BASE_URL"),
            refresh_interval: Duration::from_millis(parsed_or(
                "MP_REFRESH_INTERVAL_MS",
                get("MP_REFRESH_INTERVAL_MS"),
                DEFAULT_REFRESH_INTERVAL_MS,
            )),
            rate_limit: Duration::from_millis(parsed_or(
                "MP_RATE_LIMIT_MS",
                get("MP_RATE_LIMIT_MS"),
                DEFAULT_MIN_INTERVAL.as_millis() as u64,
            )),
            chart_timeframe: parsed_or(
                "MP_CHART_TIMEFRAME",
                get("MP_CHART_TIMEFRAME"),
                TimeFrame::default(),
            ),
            chart_width: parsed_or("MP_CHART_WIDTH", get("MP_CHART_WIDTH"), DEFAULT_CHART_WIDTH),
            chart_height: parsed_or(
                "MP_CHART_HEIGHT",
                get("MP_CHART_HEIGHT"),
                DEFAULT_CHART_HEIGHT,
            ),
            chart_out: PathBuf::from(
                get("MP_CHART_OUT").unwrap_or_else(|| DEFAULT_CHART_OUT.to_string()),
            ),
            theme: parsed_or("MP_THEME", get("MP_THEME"), ChartTheme::default()),
            symbols,
            chart_symbol,
        }
    }
}

fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(normalize_symbol) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

fn parsed_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {}={:?} ({}), using default", key, raw, e);
            default
        }),
    }
}
