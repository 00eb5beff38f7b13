//! Fallback series for charts without real data.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use marketpulse_market_data::TimeSeriesPoint;

use super::timeframe::TimeFrame;

const BASE_PRICE_MIN: f64 = 150.0;
const BASE_PRICE_MAX: f64 = 250.0;
/// Largest close-to-close move, as a fraction of the previous close.
const MAX_STEP: f64 = 0.01;
/// Largest wick beyond the open/close body.
const MAX_WICK: f64 = 0.005;
const MAX_VOLUME: u64 = 1_000_000;
const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Random walk shaped like `timeframe`: its synthetic length and spacing,
/// strictly increasing timestamps ending at `now`.
pub fn synthesize<R: Rng + ?Sized>(
    timeframe: TimeFrame,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<TimeSeriesPoint> {
    let len = timeframe.synthetic_len();
    let spacing = timeframe.synthetic_spacing();
    let mut close = rng.gen_range(BASE_PRICE_MIN..BASE_PRICE_MAX);

    (0..len)
        .map(|i| {
            let open = close;
            close = (open * (1.0 + rng.gen_range(-MAX_STEP..=MAX_STEP))).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..=MAX_WICK));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..=MAX_WICK));
            let steps_back = (len - 1 - i) as i32;

            TimeSeriesPoint {
                timestamp: now - spacing * steps_back,
                open: price(open),
                high: price(high),
                low: price(low),
                close: price(close),
                volume: rng.gen_range(0..MAX_VOLUME),
            }
        })
        .collect()
}

fn price(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .unwrap_or(MIN_PRICE)
        .max(MIN_PRICE)
}
