//! Timeframe windowing with a tagged synthetic fallback.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use marketpulse_market_data::{MarketDataError, TimeSeriesPoint};

use super::synthetic::synthesize;
use super::timeframe::{TimeFrame, WindowRule};

/// Why a window holds synthetic data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "message")]
pub enum DegradedReason {
    /// The series was empty.
    NoData,
    /// Fetching the series failed.
    FetchFailed(String),
    /// The series had points, but none inside the timeframe.
    EmptyWindow,
}

/// A timeframe slice, either genuine or synthesized. Never empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ChartWindow {
    Real {
        series: Vec<TimeSeriesPoint>,
    },
    Degraded {
        series: Vec<TimeSeriesPoint>,
        reason: DegradedReason,
    },
}

impl ChartWindow {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        match self {
            Self::Real { series } | Self::Degraded { series, .. } => series,
        }
    }

    pub fn into_points(self) -> Vec<TimeSeriesPoint> {
        match self {
            Self::Real { series } | Self::Degraded { series, .. } => series,
        }
    }

    pub fn reason(&self) -> Option<&DegradedReason> {
        match self {
            Self::Real { .. } => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// Slice `series` for `timeframe`, falling back to a synthetic walk when
/// there is nothing to show.
///
/// Pure given `now` and the RNG. The input is sorted ascending before the
/// timeframe rule applies.
pub fn window<R: Rng + ?Sized>(
    series: &[TimeSeriesPoint],
    timeframe: TimeFrame,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ChartWindow {
    if series.is_empty() {
        return degraded(DegradedReason::NoData, timeframe, now, rng);
    }

    let mut sorted = series.to_vec();
    sorted.sort_by_key(|point| point.timestamp);

    let sliced = match timeframe.rule() {
        WindowRule::Last(count) => sorted.split_off(sorted.len().saturating_sub(count)),
        WindowRule::Since(span) => {
            let cutoff = now - span;
            sorted.retain(|point| point.timestamp >= cutoff);
            sorted
        }
    };

    if sliced.is_empty() {
        return degraded(DegradedReason::EmptyWindow, timeframe, now, rng);
    }

    debug!(
        "Windowed {} of {} points for {}",
        sliced.len(),
        series.len(),
        timeframe
    );
    ChartWindow::Real { series: sliced }
}

/// [`window`] over a fetch outcome; a failed fetch degrades with its message.
pub fn window_result<R: Rng + ?Sized>(
    result: Result<Vec<TimeSeriesPoint>, MarketDataError>,
    timeframe: TimeFrame,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ChartWindow {
    match result {
        Ok(series) => window(&series, timeframe, now, rng),
        Err(e) => degraded(DegradedReason::FetchFailed(e.to_string()), timeframe, now, rng),
    }
}

fn degraded<R: Rng + ?Sized>(
    reason: DegradedReason,
    timeframe: TimeFrame,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ChartWindow {
    warn!("Using synthetic {} chart data: {:?}", timeframe, reason);
    ChartWindow::Degraded {
        series: synthesize(timeframe, now, rng),
        reason,
    }
}
