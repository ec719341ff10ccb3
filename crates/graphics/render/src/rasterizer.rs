use math::{Rectangle, Vec2D};

use crate::{Antialias, Trapezoid, Traps};

/// Computes per-pixel coverage of a set of trapezoids
#[derive(Clone, Debug)]
pub struct Rasterizer {
    area: Rectangle<i32>,
    width: usize,
    height: usize,

    /// Every row has two extra cells on the right, so lines ending
    /// exactly on the right border can be accumulated without bounds checks
    stride: usize,
    buffer: Vec<f32>,
    antialias: Antialias,
}

impl Rasterizer {
    /// Create a rasterizer for the pixels inside `area`
    #[must_use]
    pub fn new(area: Rectangle<i32>, antialias: Antialias) -> Self {
        let width = usize::try_from(area.width()).unwrap_or_default();
        let height = usize::try_from(area.height()).unwrap_or_default();
        let stride = width + 2;
        Self {
            area,
            width,
            height,
            stride,
            buffer: vec![0.; stride * height],
            antialias,
        }
    }

    #[must_use]
    pub fn into_mask(mut self) -> Mask {
        if self.antialias.is_enabled() {
            self.accumulate();
        }

        let mut coverage = Vec::with_capacity(self.width * self.height);
        for row in self.buffer.chunks_exact(self.stride) {
            coverage.extend(row[..self.width].iter().map(|value| value.abs().min(1.)));
        }

        Mask {
            area: self.area,
            width: self.width,
            coverage,
        }
    }

    pub fn add_traps(&mut self, traps: &Traps) {
        for trap in traps.traps() {
            self.add_trapezoid(trap);
        }
    }

    pub fn add_trapezoid(&mut self, trap: &Trapezoid) {
        if !self.antialias.is_enabled() {
            self.sample_trapezoid(trap);
            return;
        }

        let top = trap.top.to_f64();
        let bottom = trap.bottom.to_f64();
        let point = |x: f64, y: f64| Vec2D::new(x, y);

        // Left edge downwards, right edge upwards, so that the area between them
        // accumulates positive coverage
        self.draw_line(
            point(trap.left.x_at_f64(top), top),
            point(trap.left.x_at_f64(bottom), bottom),
        );
        self.draw_line(
            point(trap.right.x_at_f64(bottom), bottom),
            point(trap.right.x_at_f64(top), top),
        );
    }

    /// Binary coverage: a pixel is covered if its center is inside the trapezoid
    fn sample_trapezoid(&mut self, trap: &Trapezoid) {
        let origin = self.area.top_left().map(f64::from);
        let top = trap.top.to_f64() - origin.y;
        let bottom = trap.bottom.to_f64() - origin.y;

        let first_row = (top - 0.5).ceil().max(0.) as usize;
        let last_row = ((bottom - 0.5).ceil().max(0.) as usize).min(self.height);

        for row in first_row..last_row {
            let y = row as f64 + 0.5;
            let left = trap.left.x_at_f64(y + origin.y) - origin.x;
            let right = trap.right.x_at_f64(y + origin.y) - origin.x;

            let first_column = (left - 0.5).ceil().max(0.) as usize;
            let last_column = ((right - 0.5).ceil().max(0.) as usize).min(self.width);
            let row_start = row * self.stride;
            for value in &mut self.buffer[row_start + first_column.min(last_column)..row_start + last_column] {
                *value = 1.;
            }
        }
    }

    /// Rasterize a 2D Line, in device coordinates.
    ///
    /// Lines pointing downwards add coverage to everything on their right,
    /// lines pointing upwards remove it.
    /// **Greatly** inspired by <https://github.com/raphlinus/font-rs/blob/master/src/raster.rs#L44>
    pub fn draw_line(&mut self, from: Vec2D, to: Vec2D) {
        let origin = self.area.top_left().map(f64::from);
        let from = from - origin;
        let to = to - origin;

        // The rasterizer does not draw horizontal lines, those are covered by the fill
        // algorithm
        if from.y == to.y || !from.is_finite() || !to.is_finite() {
            return;
        }

        // Make sure to always go from the lower point to the higher one
        let (direction, top, bottom) = if from.y < to.y {
            (1., from, to)
        } else {
            (-1., to, from)
        };

        let height = self.height as f64;
        if bottom.y <= 0. || top.y >= height {
            return;
        }

        // Clip vertically
        let at_y = |y: f64| top.lerp(bottom, (y - top.y) / (bottom.y - top.y));
        let top = if top.y < 0. { at_y(0.) } else { top };
        let bottom = if bottom.y > height { at_y(height) } else { bottom };

        // Split the line where it leaves the area horizontally. Parts outside
        // are moved onto the border, they still contribute to the winding of
        // everything to their right
        let width = self.width as f64;
        let mut splits = [0., 1., 1., 1.];
        for (index, border) in [0., width].into_iter().enumerate() {
            let t = (border - top.x) / (bottom.x - top.x);
            if t > 0. && t < 1. {
                splits[index + 1] = t;
            }
        }
        splits[1..3].sort_by(f64::total_cmp);

        for part in splits.windows(2) {
            if part[0] >= part[1] {
                continue;
            }
            let clamp = |point: Vec2D| Vec2D::new(point.x.clamp(0., width), point.y);
            let part_top = clamp(top.lerp(bottom, part[0]));
            let part_bottom = clamp(top.lerp(bottom, part[1]));
            if part_top.y < part_bottom.y {
                self.accumulate_line(part_top, part_bottom, direction);
            }
        }
    }

    /// Add the signed area of a line to the cells it passes through.
    ///
    /// The line must point downwards and lie entirely inside the area.
    fn accumulate_line(&mut self, top: Vec2D, bottom: Vec2D, direction: f64) {
        let width = self.width as f64;
        let line_slope = (bottom.x - top.x) / (bottom.y - top.y);

        let mut x = top.x;
        let y_start = top.y.floor() as usize;
        let y_end = (bottom.y.ceil() as usize).min(self.height);

        for y in y_start..y_end {
            let linestart = y * self.stride;

            // The y-delta covered by this line segment.
            // Will usually be one, except for the first and last segments
            let dy = ((y + 1) as f64).min(bottom.y) - (y as f64).max(top.y);

            // The x coordinate where this line segment will end
            let x_next = (x + line_slope * dy).clamp(0., width);

            let d = dy * direction;

            let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };

            let x0_floor = x0.floor();
            let x0i = x0_floor as usize;
            let x1_ceil = x1.ceil();
            let x1i = x1_ceil as usize;
            if x1i <= x0i + 1 {
                // The segment stays within a single pixel
                let xmf = 0.5 * (x + x_next) - x0_floor;
                self.buffer[linestart + x0i] += (d - d * xmf) as f32;
                self.buffer[linestart + x0i + 1] += (d * xmf) as f32;
            } else {
                let s = (x1 - x0).recip();
                let x0f = x0 - x0_floor;
                let a0 = 0.5 * s * (1. - x0f) * (1. - x0f);
                let x1f = x1 - x1_ceil + 1.;
                let am = 0.5 * s * x1f * x1f;

                self.buffer[linestart + x0i] += (d * a0) as f32;
                if x1i == x0i + 2 {
                    self.buffer[linestart + x0i + 1] += (d * (1. - a0 - am)) as f32;
                } else {
                    let a1 = s * (1.5 - x0f);
                    self.buffer[linestart + x0i + 1] += (d * (a1 - a0)) as f32;
                    for xi in x0i + 2..x1i - 1 {
                        self.buffer[linestart + xi] += (d * s) as f32;
                    }
                    let a2 = a1 + (x1i - x0i - 3) as f64 * s;
                    self.buffer[linestart + x1i - 1] += (d * (1. - a2 - am)) as f32;
                }

                self.buffer[linestart + x1i] += (d * am) as f32;
            }
            x = x_next;
        }
    }

    /// Turn the accumulated signed areas into coverage, one row at a time
    fn accumulate(&mut self) {
        for row in self.buffer.chunks_exact_mut(self.stride) {
            let mut accumulator = 0.;
            for elem in row {
                accumulator += *elem;
                *elem = accumulator;
            }
        }
    }
}

/// Per-pixel coverage for a rectangular area of the device
#[derive(Clone, Debug)]
pub struct Mask {
    area: Rectangle<i32>,
    width: usize,
    coverage: Vec<f32>,
}

impl Mask {
    /// Rasterize `traps` inside `area`
    #[must_use]
    pub fn from_traps(traps: &Traps, area: Rectangle<i32>, antialias: Antialias) -> Self {
        let mut rasterizer = Rasterizer::new(area, antialias);
        rasterizer.add_traps(traps);
        rasterizer.into_mask()
    }

    /// The coverage of the pixel at `(x, y)` in device space, zero outside of the mask
    #[must_use]
    pub fn coverage_at(&self, x: i32, y: i32) -> f32 {
        let top_left = self.area.top_left();
        let (Ok(column), Ok(row)) = (
            usize::try_from(x - top_left.x),
            usize::try_from(y - top_left.y),
        ) else {
            return 0.;
        };

        if column >= self.width {
            return 0.;
        }

        self.coverage
            .get(row * self.width + column)
            .copied()
            .unwrap_or_default()
    }
}
