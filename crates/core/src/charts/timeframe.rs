use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use marketpulse_market_data::IntradayInterval;

/// Named chart slicing rule.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[default]
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

/// How a timeframe cuts an ascending series.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WindowRule {
    /// Keep the last `n` points.
    Last(usize),
    /// Keep points no older than `now - span`.
    Since(Duration),
}

/// Which provider series feeds a timeframe.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeriesSource {
    Intraday(IntradayInterval),
    Daily,
}

/// One trading session of 5-minute bars.
pub const SESSION_BARS: usize = 78;

/// One trading year of daily bars.
pub const TRADING_YEAR_BARS: usize = 252;

impl TimeFrame {
    pub const ALL: [TimeFrame; 5] = [
        Self::OneDay,
        Self::OneWeek,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::OneYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::OneYear => "1Y",
        }
    }

    pub fn rule(&self) -> WindowRule {
        match self {
            Self::OneDay => WindowRule::Last(SESSION_BARS),
            Self::OneWeek => WindowRule::Since(Duration::days(7)),
            Self::OneMonth => WindowRule::Since(Duration::days(30)),
            Self::ThreeMonths => WindowRule::Since(Duration::days(90)),
            Self::OneYear => WindowRule::Last(TRADING_YEAR_BARS),
        }
    }

    pub fn source(&self) -> SeriesSource {
        match self {
            Self::OneDay => SeriesSource::Intraday(IntradayInterval::FiveMinutes),
            _ => SeriesSource::Daily,
        }
    }

    /// Number of points in a synthesized fallback series.
    pub fn synthetic_len(&self) -> usize {
        match self {
            Self::OneDay => SESSION_BARS,
            Self::OneWeek => 7,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::OneYear => TRADING_YEAR_BARS,
        }
    }

    /// Spacing between synthesized points.
    pub fn synthetic_spacing(&self) -> Duration {
        match self.source() {
            SeriesSource::Intraday(interval) => Duration::minutes(interval.minutes()),
            SeriesSource::Daily => Duration::days(1),
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|tf| tf.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown timeframe: {}", wanted))
    }
}
