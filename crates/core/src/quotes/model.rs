use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketpulse_market_data::{Quote, SymbolFailure};

/// Default spacing between two scheduled fetch cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// What the poller fetches and how often.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollerConfig {
    pub symbols: Vec<String>,
    /// Zero disables the timer: one fetch at start, then manual refetch only.
    pub refresh_interval: Duration,
    pub enabled: bool,
}

impl PollerConfig {
    pub fn new(symbols: Vec<String>) -> Self {
        Self {
            symbols,
            ..Self::default()
        }
    }

    /// Whether a driver should run for this configuration.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.symbols.is_empty()
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            enabled: true,
        }
    }
}

/// Lifecycle of a [`QuotePoller`](super::QuotePoller).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PollerState {
    /// Not started, disabled, or nothing to poll.
    #[default]
    Idle,
    Fetching,
    /// Last cycle succeeded.
    Ready,
    /// Last cycle failed; quotes are from an earlier cycle.
    Error,
    /// Torn down. Terminal.
    Stopped,
}

/// Latest known quotes plus fetch status.
///
/// `quotes`, `failures` and `last_updated` only change together, at the end of
/// a successful cycle. A failed cycle sets `last_error` and leaves them alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    pub quotes: Vec<Quote>,
    /// Symbols that failed in the last successful cycle
    pub failures: Vec<SymbolFailure>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl PollSnapshot {
    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.symbol.eq_ignore_ascii_case(symbol))
    }
}
