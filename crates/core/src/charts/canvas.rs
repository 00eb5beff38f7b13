//! Minimal RGBA8 raster with the few primitives a price chart needs.

use std::io::{self, Write};

use crate::errors::{ChartError, Result};

/// Largest accepted canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// 8-bit RGBA color, straight (not premultiplied) alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Same color with alpha set to `opacity` (clamped to `0.0..=1.0`).
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }
}

/// Row-major RGBA8 pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Transparent canvas of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        validate_size(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let offset = self.offset(i64::from(x), i64::from(y))?;
        let p = &self.pixels[offset..offset + 4];
        Some(Rgba::new(p[0], p[1], p[2], p[3]))
    }

    /// Overwrite every pixel.
    pub fn fill(&mut self, color: Rgba) {
        for p in self.pixels.chunks_exact_mut(4) {
            p.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Composite `color` over one pixel. Out-of-bounds writes are dropped.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if color.a == 0 {
            return;
        }
        let Some(offset) = self.offset(x, y) else {
            return;
        };

        let p = &mut self.pixels[offset..offset + 4];
        let src_a = f64::from(color.a) / 255.0;
        let dst_a = f64::from(p[3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }

        let mix = |src: u8, dst: u8| -> u8 {
            let value =
                (f64::from(src) * src_a + f64::from(dst) * dst_a * (1.0 - src_a)) / out_a;
            value.round().clamp(0.0, 255.0) as u8
        };
        p[0] = mix(color.r, p[0]);
        p[1] = mix(color.g, p[1]);
        p[2] = mix(color.b, p[2]);
        p[3] = (out_a * 255.0).round() as u8;
    }

    /// Stroke a segment `width` pixels thick with round caps.
    ///
    /// A pixel is painted when its center lies within `width / 2` of the
    /// segment.
    pub fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) {
        let half = (width / 2.0).max(0.5);
        let min_x = (from.0.min(to.0) - half).floor() as i64;
        let max_x = (from.0.max(to.0) + half).ceil() as i64;
        let min_y = (from.1.min(to.1) - half).floor() as i64;
        let max_y = (from.1.max(to.1) + half).ceil() as i64;

        for y in min_y.max(0)..=max_y.min(i64::from(self.height) - 1) {
            for x in min_x.max(0)..=max_x.min(i64::from(self.width) - 1) {
                let center = (x as f64 + 0.5, y as f64 + 0.5);
                if distance_to_segment(center, from, to) <= half {
                    self.blend(x, y, color);
                }
            }
        }
    }

    pub fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Rgba) {
        self.stroke_line(center, center, radius * 2.0, color);
    }

    /// Vertical dashed line, one pixel wide, alternating `dash` painted and
    /// `dash` skipped pixels starting at `top`.
    pub fn dashed_vline(&mut self, x: f64, top: f64, bottom: f64, dash: u32, color: Rgba) {
        let column = x.floor() as i64;
        let dash = i64::from(dash.max(1));
        let top = top.floor() as i64;
        let bottom = bottom.ceil() as i64;

        for y in top..bottom {
            if ((y - top) / dash) % 2 == 0 {
                self.blend(column, y, color);
            }
        }
    }

    /// Binary PPM (P6). Alpha is dropped, so fill an opaque background first.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for p in self.pixels.chunks_exact(4) {
            out.write_all(&p[..3])?;
        }
        out.flush()
    }

    pub fn to_ppm(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.pixels.len() / 4 * 3 + 32);
        // Writing into a Vec cannot fail
        let _ = self.write_ppm(&mut buffer);
        buffer
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

pub(crate) fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(ChartError::InvalidCanvas { width, height });
    }
    Ok(())
}

fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
