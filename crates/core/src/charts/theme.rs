use std::str::FromStr;

use super::canvas::Rgba;

/// Colors and stroke sizes for a chart.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartTheme {
    pub background: Rgba,
    /// Line color when the series closed at or above its first close
    pub up: Rgba,
    pub down: Rgba,
    /// Hover guide line
    pub guide: Rgba,
    /// Ring around the hover marker
    pub marker_ring: Rgba,
    pub line_width: f64,
    /// Area fill opacity at the top of the plot, fading to 0 at the baseline
    pub area_top_alpha: f64,
    pub marker_radius: f64,
    pub marker_ring_width: f64,
    /// Dash and gap length of the guide line, in pixels
    pub guide_dash: u32,
}

impl ChartTheme {
    pub fn light() -> Self {
        Self {
            background: Rgba::rgb(0xFF, 0xFF, 0xFF),
            up: Rgba::rgb(0x10, 0xB9, 0x81),
            down: Rgba::rgb(0xEF, 0x44, 0x44),
            guide: Rgba::rgb(0x6B, 0x72, 0x80).with_opacity(0.5),
            marker_ring: Rgba::rgb(0xFF, 0xFF, 0xFF),
            line_width: 2.0,
            area_top_alpha: 0.3,
            marker_radius: 4.0,
            marker_ring_width: 2.0,
            guide_dash: 3,
        }
    }

    pub fn dark() -> Self {
        let background = Rgba::rgb(0x11, 0x18, 0x27);
        Self {
            background,
            guide: Rgba::rgb(0x9C, 0xA3, 0xAF).with_opacity(0.5),
            marker_ring: background,
            ..Self::light()
        }
    }

    pub fn line_color(&self, is_up: bool) -> Rgba {
        if is_up {
            self.up
        } else {
            self.down
        }
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::light()
    }
}

impl FromStr for ChartTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::light()),
            "dark" => Ok(Self::dark()),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}
