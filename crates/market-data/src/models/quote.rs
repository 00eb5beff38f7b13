use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time price snapshot for one ticker.
///
/// `change` is taken from the provider as-is; it is not recomputed from
/// `price - previous_close`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Canonical upper-case ticker
    pub symbol: String,

    /// Latest trade price
    pub price: Decimal,

    /// Absolute change against the previous close
    pub change: Decimal,

    /// Percent change against the previous close (`1.52` means 1.52%)
    pub change_percent: Decimal,

    /// Session volume
    pub volume: u64,

    /// Previous session close
    pub previous_close: Decimal,
}

impl Quote {
    /// Returns true when the price did not fall against the previous close.
    pub fn is_up(&self) -> bool {
        self.change >= Decimal::ZERO
    }
}

/// Trims and upper-cases a ticker symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
