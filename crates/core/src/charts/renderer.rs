//! Price chart rendering and pointer hit-testing.
//!
//! The x-scale maps `[first.timestamp, last.timestamp]` onto `[0, width]`;
//! the y-scale maps the close range, padded by 10% on each side, onto
//! `[height, 0]`. Hit-testing inverts the x-scale and bisects the timestamps,
//! so hover lookups stay logarithmic in the series length.

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use marketpulse_market_data::TimeSeriesPoint;

use super::canvas::{validate_size, Canvas};
use super::scale::LinearScale;
use super::theme::ChartTheme;
use super::window::ChartWindow;
use crate::errors::{ChartError, Result};

/// Vertical padding around the close range, as a fraction of that range.
const Y_PADDING: f64 = 0.1;

/// The point under the pointer, with where to draw its marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverPoint {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
    pub x: f64,
    pub y: f64,
    /// Horizontal tooltip shift, in percent of its own width
    pub tooltip_offset_pct: f64,
}

/// Draws one windowed series and tracks hover state.
pub struct ChartRenderer {
    series: Vec<TimeSeriesPoint>,
    /// Timestamps in epoch milliseconds, ascending
    stamps: Vec<f64>,
    x_scale: LinearScale,
    y_scale: LinearScale,
    width: u32,
    height: u32,
    theme: ChartTheme,
    hover: Option<HoverPoint>,
}

impl ChartRenderer {
    pub fn new(window: &ChartWindow, width: u32, height: u32, theme: ChartTheme) -> Result<Self> {
        validate_size(width, height)?;

        let series = window.points().to_vec();
        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ChartError::EmptySeries),
        };

        let stamps: Vec<f64> = series.iter().map(|p| millis(p.timestamp)).collect();
        let x_scale = LinearScale::new(
            (millis(first.timestamp), millis(last.timestamp)),
            (0.0, f64::from(width)),
        );

        let (min_close, max_close) = series
            .iter()
            .map(|p| to_f64(p.close))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
                (lo.min(c), hi.max(c))
            });
        let padding = (max_close - min_close) * Y_PADDING;
        let y_scale = LinearScale::new(
            (min_close - padding, max_close + padding),
            (f64::from(height), 0.0),
        );

        Ok(Self {
            series,
            stamps,
            x_scale,
            y_scale,
            width,
            height,
            theme,
            hover: None,
        })
    }

    pub fn x_scale(&self) -> &LinearScale {
        &self.x_scale
    }

    pub fn y_scale(&self) -> &LinearScale {
        &self.y_scale
    }

    /// True when the last close is at or above the first.
    pub fn is_up(&self) -> bool {
        match (self.series.first(), self.series.last()) {
            (Some(first), Some(last)) => last.close >= first.close,
            _ => true,
        }
    }

    /// Pixel position of point `index`.
    pub fn position(&self, index: usize) -> Option<(f64, f64)> {
        let point = self.series.get(index)?;
        Some((
            self.x_scale.map(self.stamps[index]),
            self.y_scale.map(to_f64(point.close)),
        ))
    }

    /// Index of the point nearest to pointer column `x`.
    ///
    /// Bisects for the first timestamp after the inverted one (never below
    /// index 1), then picks the closer of the two neighbors. Ties go to the
    /// earlier point.
    pub fn hit_test(&self, x: f64) -> Option<usize> {
        if self.stamps.is_empty() {
            return None;
        }

        let target = self.x_scale.invert(x);
        let index = 1 + self.stamps[1..].partition_point(|stamp| *stamp <= target);
        let before = index - 1;

        match self.stamps.get(index) {
            Some(after) if (target - self.stamps[before]).abs() > (target - after).abs() => {
                Some(index)
            }
            _ => Some(before),
        }
    }

    /// Update hover state for a pointer at column `x`.
    pub fn pointer_move(&mut self, x: f64) -> Option<&HoverPoint> {
        let index = self.hit_test(x)?;
        let (px, py) = self.position(index)?;
        let point = &self.series[index];

        self.hover = Some(HoverPoint {
            index,
            timestamp: point.timestamp,
            close: point.close,
            x: px,
            y: py,
            tooltip_offset_pct: -(1.0 - px / f64::from(self.width)) * 100.0,
        });
        self.hover.as_ref()
    }

    pub fn pointer_leave(&mut self) {
        self.hover = None;
    }

    pub fn hover(&self) -> Option<&HoverPoint> {
        self.hover.as_ref()
    }

    /// Area fill, price line, then the hover guide and marker if any.
    pub fn render(&self) -> Result<Canvas> {
        let mut canvas = Canvas::new(self.width, self.height)?;
        canvas.fill(self.theme.background);

        let color = self.theme.line_color(self.is_up());
        let points: Vec<(f64, f64)> = (0..self.series.len())
            .filter_map(|i| self.position(i))
            .collect();

        self.fill_area(&mut canvas, &points);

        match points.as_slice() {
            [only] => canvas.fill_circle(*only, self.theme.line_width, color),
            _ => {
                for segment in points.windows(2) {
                    canvas.stroke_line(segment[0], segment[1], self.theme.line_width, color);
                }
            }
        }

        if let Some(hover) = &self.hover {
            canvas.dashed_vline(
                hover.x,
                0.0,
                f64::from(self.height),
                self.theme.guide_dash,
                self.theme.guide,
            );
            canvas.fill_circle(
                (hover.x, hover.y),
                self.theme.marker_radius + self.theme.marker_ring_width,
                self.theme.marker_ring,
            );
            canvas.fill_circle((hover.x, hover.y), self.theme.marker_radius, color);
        }

        debug!(
            "Rendered {} points on {}x{} canvas",
            self.series.len(),
            self.width,
            self.height
        );
        Ok(canvas)
    }

    /// Fill below the line with a vertical gradient: `area_top_alpha` at the
    /// top of the plot, transparent at the baseline.
    fn fill_area(&self, canvas: &mut Canvas, points: &[(f64, f64)]) {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return;
        };
        let color = self.theme.line_color(self.is_up());
        let height = f64::from(self.height);

        let start = first.0.floor().max(0.0) as i64;
        let end = last.0.ceil().min(f64::from(self.width)) as i64;
        for column in start..end {
            let Some(line_y) = polyline_y(points, column as f64 + 0.5) else {
                continue;
            };
            for row in line_y.ceil().max(0.0) as i64..self.height as i64 {
                let alpha = self.theme.area_top_alpha * (1.0 - (row as f64 + 0.5) / height);
                canvas.blend(column, row, color.with_opacity(alpha));
            }
        }
    }
}

/// Height of the polyline at column `x`, interpolating between neighbors.
fn polyline_y(points: &[(f64, f64)], x: f64) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;
    if x < first.0 || x > last.0 {
        return None;
    }

    let index = points.partition_point(|p| p.0 < x);
    if index == 0 {
        return Some(first.1);
    }
    let (a, b) = (points[index - 1], points[index]);
    if b.0 == a.0 {
        return Some(a.1.min(b.1));
    }
    Some(a.1 + (x - a.0) * (b.1 - a.1) / (b.0 - a.0))
}

fn millis(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp_millis() as f64
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use crate::charts::canvas::Rgba;

    fn series(closes: &[Decimal]) -> ChartWindow {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        ChartWindow::Real {
            series: closes
                .iter()
                .enumerate()
                .map(|(i, close)| TimeSeriesPoint {
                    timestamp: start + Duration::minutes(i as i64),
                    open: *close,
                    high: *close,
                    low: *close,
                    close: *close,
                    volume: 100,
                })
                .collect(),
        }
    }

    /// Five points, one minute apart, 100 px apart on a 400 px canvas.
    fn renderer() -> ChartRenderer {
        let window = series(&[dec!(10), dec!(12), dec!(11), dec!(15), dec!(14)]);
        ChartRenderer::new(&window, 400, 200, ChartTheme::light()).unwrap()
    }

    #[test]
    fn test_rejects_bad_input() {
        let window = series(&[dec!(1)]);
        assert!(matches!(
            ChartRenderer::new(&window, 0, 100, ChartTheme::light()),
            Err(ChartError::InvalidCanvas { .. })
        ));

        let empty = ChartWindow::Real { series: vec![] };
        assert!(matches!(
            ChartRenderer::new(&empty, 100, 100, ChartTheme::light()),
            Err(ChartError::EmptySeries)
        ));
    }

    #[test]
    fn test_scales() {
        let chart = renderer();
        assert_eq!(chart.position(0).unwrap().0, 0.0);
        assert_eq!(chart.position(4).unwrap().0, 400.0);

        // Closes 10..15 padded by 0.5 on each side
        assert_eq!(chart.y_scale().domain(), (9.5, 15.5));
        let (_, y_max) = chart.position(3).unwrap();
        let (_, y_min) = chart.position(0).unwrap();
        assert!(y_max < y_min);
    }

    #[test]
    fn test_hit_test_exact_points() {
        let chart = renderer();
        for i in 0..5 {
            let (x, _) = chart.position(i).unwrap();
            assert_eq!(chart.hit_test(x), Some(i));
        }
    }

    #[test]
    fn test_hit_test_nearest_and_ties() {
        let chart = renderer();
        assert_eq!(chart.hit_test(149.0), Some(1));
        assert_eq!(chart.hit_test(151.0), Some(2));
        // Exactly halfway resolves to the earlier point
        assert_eq!(chart.hit_test(150.0), Some(1));
        assert_eq!(chart.hit_test(50.0), Some(0));
    }

    #[test]
    fn test_hit_test_outside_plot_clamps() {
        let chart = renderer();
        assert_eq!(chart.hit_test(-40.0), Some(0));
        assert_eq!(chart.hit_test(1000.0), Some(4));
    }

    #[test]
    fn test_single_point_series() {
        let window = series(&[dec!(42)]);
        let chart = ChartRenderer::new(&window, 100, 50, ChartTheme::light()).unwrap();

        assert_eq!(chart.hit_test(80.0), Some(0));
        assert_eq!(chart.position(0), Some((50.0, 25.0)));
        assert!(chart.render().is_ok());
    }

    #[test]
    fn test_pointer_move_and_leave() {
        let mut chart = renderer();

        let hover = chart.pointer_move(310.0).unwrap().clone();
        assert_eq!(hover.index, 3);
        assert_eq!(hover.close, dec!(15));
        assert_eq!(hover.x, 300.0);
        assert_eq!(hover.tooltip_offset_pct, -25.0);

        chart.pointer_leave();
        assert!(chart.hover().is_none());
    }

    #[test]
    fn test_color_follows_direction() {
        let up = renderer();
        assert!(up.is_up());

        let flat = ChartRenderer::new(&series(&[dec!(5), dec!(5)]), 10, 10, ChartTheme::light())
            .unwrap();
        assert!(flat.is_up());

        let down = ChartRenderer::new(&series(&[dec!(5), dec!(4)]), 10, 10, ChartTheme::light())
            .unwrap();
        assert!(!down.is_up());
    }

    #[test]
    fn test_render_draws_line_and_fill() {
        let chart = renderer();
        let canvas = chart.render().unwrap();
        let theme = ChartTheme::light();

        // On the line at point 2
        let (x, y) = chart.position(2).unwrap();
        assert_eq!(canvas.pixel(x as u32, y as u32), Some(theme.up));

        // Under the line: tinted, not background
        let below = canvas.pixel(x as u32, (y as u32 + 200) / 2).unwrap();
        assert_ne!(below, theme.background);

        // Above the line: untouched background
        assert_eq!(canvas.pixel(x as u32, 0), Some(theme.background));
    }

    #[test]
    fn test_render_hover_marker() {
        let mut chart = renderer();
        chart.pointer_move(200.0);
        let canvas = chart.render().unwrap();

        let hover = chart.hover().unwrap();
        assert_eq!(
            canvas.pixel(hover.x as u32, hover.y as u32),
            Some(ChartTheme::light().up)
        );
        // Guide line tints the first pixel of the column
        assert_ne!(
            canvas.pixel(hover.x as u32, 0),
            Some(ChartTheme::light().background)
        );
        assert_ne!(canvas.pixel(0, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_polyline_y() {
        let points = [(0.0, 10.0), (10.0, 20.0), (20.0, 0.0)];
        assert_eq!(polyline_y(&points, 5.0), Some(15.0));
        assert_eq!(polyline_y(&points, 15.0), Some(10.0));
        assert_eq!(polyline_y(&points, 0.0), Some(10.0));
        assert_eq!(polyline_y(&points, 25.0), None);
    }
}
