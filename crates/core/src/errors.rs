//! Core error types for MarketPulse.
//!
//! Quote polling never returns errors to its caller (failures land in the
//! snapshot), so the only fallible surface here is chart rendering.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, ChartError>;

/// Errors raised while preparing or drawing a chart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    /// Nothing to draw. Windowed series are never empty, so this only
    /// happens when a caller bypasses the windower.
    #[error("Cannot render an empty series")]
    EmptySeries,

    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
}
