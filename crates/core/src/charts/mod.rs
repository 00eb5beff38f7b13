//! Chart pipeline: windowing a series for a timeframe, then drawing it.
//!
//! ```text
//! Vec<TimeSeriesPoint> ──window()──▶ ChartWindow ──ChartRenderer──▶ Canvas ──▶ PPM
//!                         │ (Real | Degraded)           │
//!                         └── synthesize() on no data   └── hit_test / pointer_move
//! ```

pub mod canvas;
pub mod renderer;
pub mod scale;
pub mod synthetic;
pub mod theme;
pub mod timeframe;
pub mod window;

pub use canvas::{Canvas, Rgba, MAX_CANVAS_SIDE};
pub use renderer::{ChartRenderer, HoverPoint};
pub use scale::LinearScale;
pub use synthetic::synthesize;
pub use theme::ChartTheme;
pub use timeframe::{SeriesSource, TimeFrame, WindowRule};
pub use window::{window, window_result, ChartWindow, DegradedReason};
