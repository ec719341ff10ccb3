//! Sources of color

use math::{AffineTransform, Color, Vec2D};

use crate::{
    operator::{Pixel, TRANSPARENT},
    surface::{Snapshot, Surface},
    Error, Result,
};

/// What happens outside the area a pattern is defined on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extend {
    /// Transparent outside of the pattern
    None,

    /// Repeat the pattern
    Repeat,

    /// Repeat the pattern, mirroring every other copy
    Reflect,

    /// Continue with the color at the closest edge
    Pad,
}

/// How surface patterns are sampled between pixel centers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    Nearest,

    #[default]
    Bilinear,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Color,
}

/// The colors of a gradient, sorted by offset
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    #[inline]
    #[must_use]
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Stops with equal offsets keep the order they were added in
    pub fn add_color_stop(&mut self, offset: f64, color: Color) {
        let offset = if offset.is_nan() { 0. } else { offset.clamp(0., 1.) };
        let index = self.stops.partition_point(|stop| stop.offset <= offset);
        self.stops.insert(index, ColorStop { offset, color });
    }

    /// The color at position `t`, which must already have the extend mode applied
    #[must_use]
    pub fn color_at(&self, t: f64) -> Color {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::TRANSPARENT;
        };

        if t <= first.offset {
            // For stops sharing the same offset, the last one wins
            let index = self.stops.partition_point(|stop| stop.offset <= t);
            return self.stops[index.max(1) - 1].color;
        }
        if t >= last.offset {
            return last.color;
        }

        // Index of the first stop after t, there is always one stop before it
        let upper = self.stops.partition_point(|stop| stop.offset <= t);
        let lower = &self.stops[upper - 1];
        let upper = &self.stops[upper];
        let local_t = (t - lower.offset) / (upper.offset - lower.offset);
        lower.color.interpolate(upper.color, local_t)
    }

    /// The average color over `0..=1`, used where a gradient is too small to
    /// be resolved
    #[must_use]
    pub fn average(&self) -> Color {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::TRANSPARENT;
        };

        let channels = |color: Color| [color.red(), color.green(), color.blue(), color.alpha()];
        let mut sum = channels(first.color).map(|channel| channel * first.offset);
        for pair in self.stops.windows(2) {
            let width = pair[1].offset - pair[0].offset;
            let (a, b) = (channels(pair[0].color), channels(pair[1].color));
            for i in 0..4 {
                sum[i] += (a[i] + b[i]) * 0.5 * width;
            }
        }
        let tail = channels(last.color).map(|channel| channel * (1. - last.offset));
        Color::rgba(
            sum[0] + tail[0],
            sum[1] + tail[1],
            sum[2] + tail[2],
            sum[3] + tail[3],
        )
    }
}

/// A quadrilateral with one color per corner.
///
/// The corners are visited in order, corner `0` is at `(u, v) = (0, 0)`,
/// then `(1, 0)`, `(1, 1)` and `(0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshPatch {
    pub corners: [Vec2D; 4],
    pub colors: [Color; 4],
}

impl MeshPatch {
    /// Find the `(u, v)` coordinates of `point` inside the patch.
    ///
    /// Based on <https://iquilezles.org/articles/ibilinear/>
    fn parameters_of(&self, point: Vec2D) -> Option<(f64, f64)> {
        let [a, b, c, d] = self.corners;
        let e = b - a;
        let f = d - a;
        let g = a - b + c - d;
        let h = point - a;

        let k2 = g.cross_product(f);
        let k1 = e.cross_product(f) + h.cross_product(g);
        let k0 = h.cross_product(e);

        let solve_u = |v: f64| {
            let x = e.x + g.x * v;
            let y = e.y + g.y * v;
            if x.abs() >= y.abs() {
                (h.x - f.x * v) / x
            } else {
                (h.y - f.y * v) / y
            }
        };
        let is_inside = |(u, v): (f64, f64)| (0. ..=1.).contains(&u) && (0. ..=1.).contains(&v);

        if k2.abs() < 1e-12 * (k1.abs() + k0.abs()).max(1.) {
            // Opposite edges are parallel, the equation is linear
            if k1 == 0. {
                return None;
            }
            let v = -k0 / k1;
            return Some((solve_u(v), v)).filter(|uv| is_inside(*uv));
        }

        let discriminant = k1 * k1 - 4. * k0 * k2;
        if discriminant < 0. {
            return None;
        }

        let root = discriminant.sqrt();
        [(-k1 - root) / (2. * k2), (-k1 + root) / (2. * k2)]
            .into_iter()
            .map(|v| (solve_u(v), v))
            .find(|uv| is_inside(*uv))
    }

    fn color_at(&self, u: f64, v: f64) -> Pixel {
        let weights = [(1. - u) * (1. - v), u * (1. - v), u * v, (1. - u) * v];
        let mut result = [0.; 4];
        for (color, weight) in self.colors.iter().zip(weights) {
            for (channel, value) in result.iter_mut().zip(color.premultiplied()) {
                *channel += value * weight as f32;
            }
        }
        result
    }
}

#[derive(Clone, Debug)]
pub enum PatternKind {
    Solid(Color),
    Linear {
        start: Vec2D,
        end: Vec2D,
        gradient: Gradient,
    },

    /// A gradient between two circles
    Radial {
        start_center: Vec2D,
        start_radius: f64,
        end_center: Vec2D,
        end_radius: f64,
        gradient: Gradient,
    },
    Mesh(Vec<MeshPatch>),
    Surface(Surface),
}

/// A source of color.
///
/// The pattern matrix maps user space to pattern space.
#[derive(Clone, Debug)]
pub struct Pattern {
    kind: PatternKind,
    matrix: AffineTransform,
    extend: Extend,
    filter: Filter,
}

impl Pattern {
    fn new(kind: PatternKind, extend: Extend) -> Self {
        Self {
            kind,
            matrix: AffineTransform::identity(),
            extend,
            filter: Filter::default(),
        }
    }

    #[must_use]
    pub fn solid(color: Color) -> Self {
        Self::new(PatternKind::Solid(color), Extend::Pad)
    }

    #[must_use]
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::solid(Color::rgb(red, green, blue))
    }

    #[must_use]
    pub fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self::solid(Color::rgba(red, green, blue, alpha))
    }

    /// A gradient along the line from `(x0, y0)` to `(x1, y1)`
    #[must_use]
    pub fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(
            PatternKind::Linear {
                start: Vec2D::new(x0, y0),
                end: Vec2D::new(x1, y1),
                gradient: Gradient::default(),
            },
            Extend::Pad,
        )
    }

    /// A gradient from the circle around `(cx0, cy0)` to the circle around `(cx1, cy1)`
    #[must_use]
    pub fn radial(cx0: f64, cy0: f64, radius0: f64, cx1: f64, cy1: f64, radius1: f64) -> Self {
        Self::new(
            PatternKind::Radial {
                start_center: Vec2D::new(cx0, cy0),
                start_radius: radius0.abs(),
                end_center: Vec2D::new(cx1, cy1),
                end_radius: radius1.abs(),
                gradient: Gradient::default(),
            },
            Extend::Pad,
        )
    }

    /// An empty mesh, see [Pattern::add_patch]
    #[must_use]
    pub fn mesh() -> Self {
        Self::new(PatternKind::Mesh(vec![]), Extend::None)
    }

    /// Use the contents of a surface as the source.
    ///
    /// The surface is read when the pattern is used, not when it is created.
    #[must_use]
    pub fn for_surface(surface: &Surface) -> Self {
        Self::new(PatternKind::Surface(surface.clone()), Extend::None)
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Add a color stop to a gradient, does nothing for other kinds of patterns.
    ///
    /// Offsets are clamped to `0..=1`.
    pub fn add_color_stop(&mut self, offset: f64, color: Color) {
        match &mut self.kind {
            PatternKind::Linear { gradient, .. } | PatternKind::Radial { gradient, .. } => {
                gradient.add_color_stop(offset, color)
            },
            _ => log::debug!("Ignoring color stop on a pattern that is not a gradient"),
        }
    }

    /// Add a patch to a mesh pattern, does nothing for other kinds of patterns.
    ///
    /// Patches added later are drawn on top of earlier ones.
    pub fn add_patch(&mut self, corners: [Vec2D; 4], colors: [Color; 4]) {
        match &mut self.kind {
            PatternKind::Mesh(patches) => patches.push(MeshPatch { corners, colors }),
            _ => log::debug!("Ignoring patch on a pattern that is not a mesh"),
        }
    }

    pub fn set_matrix(&mut self, matrix: AffineTransform) -> Result<()> {
        if !matrix.is_invertible() {
            return Err(Error::InvalidMatrix);
        }
        self.matrix = matrix;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn matrix(&self) -> AffineTransform {
        self.matrix
    }

    pub fn set_extend(&mut self, extend: Extend) {
        self.extend = extend;
    }

    #[inline]
    #[must_use]
    pub fn extend(&self) -> Extend {
        self.extend
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    #[inline]
    #[must_use]
    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Resolve the pattern for a single drawing operation.
    ///
    /// `device_to_user` maps device pixels to the user space the pattern
    /// is defined in. Surfaces are snapshotted at this point.
    #[must_use]
    pub(crate) fn prepare(&self, device_to_user: AffineTransform) -> PreparedPattern {
        let kind = match &self.kind {
            PatternKind::Solid(color) => PreparedKind::Solid(color.premultiplied()),
            PatternKind::Linear {
                start,
                end,
                gradient,
            } => {
                let direction = *end - *start;
                let length_squared = direction.dot(direction);
                if length_squared == 0. || !length_squared.is_finite() {
                    PreparedKind::Solid(self.degenerate_color(gradient))
                } else {
                    PreparedKind::Linear {
                        start: *start,
                        direction: direction / length_squared,
                        gradient: gradient.clone(),
                    }
                }
            },
            PatternKind::Radial {
                start_center,
                start_radius,
                end_center,
                end_radius,
                gradient,
            } => {
                if start_center == end_center && start_radius == end_radius {
                    PreparedKind::Solid(self.degenerate_color(gradient))
                } else {
                    PreparedKind::Radial {
                        start_center: *start_center,
                        start_radius: *start_radius,
                        center_delta: *end_center - *start_center,
                        radius_delta: end_radius - start_radius,
                        gradient: gradient.clone(),
                    }
                }
            },
            PatternKind::Mesh(patches) => PreparedKind::Mesh(patches.clone()),
            PatternKind::Surface(surface) => PreparedKind::Surface(surface.snapshot()),
        };

        PreparedPattern {
            kind,
            to_pattern: device_to_user.chain(self.matrix),
            extend: self.extend,
            filter: self.filter,
        }
    }

    /// The color of a gradient that has no extent
    fn degenerate_color(&self, gradient: &Gradient) -> Pixel {
        match self.extend {
            Extend::None => TRANSPARENT,
            Extend::Pad => gradient
                .stops()
                .last()
                .map_or(TRANSPARENT, |stop| stop.color.premultiplied()),
            Extend::Repeat | Extend::Reflect => gradient.average().premultiplied(),
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::solid(Color::BLACK)
    }
}

#[derive(Clone, Debug)]
enum PreparedKind {
    Solid(Pixel),
    Linear {
        start: Vec2D,

        /// Scaled so that `(p - start) · direction` is the gradient parameter
        direction: Vec2D,
        gradient: Gradient,
    },
    Radial {
        start_center: Vec2D,
        start_radius: f64,
        center_delta: Vec2D,
        radius_delta: f64,
        gradient: Gradient,
    },
    Mesh(Vec<MeshPatch>),
    Surface(Snapshot),
}

/// A pattern that is ready to be evaluated at device pixels
#[derive(Clone, Debug)]
pub(crate) struct PreparedPattern {
    kind: PreparedKind,
    to_pattern: AffineTransform,
    extend: Extend,
    filter: Filter,
}

impl PreparedPattern {
    /// The premultiplied color at the center of the device pixel `(x, y)`
    #[must_use]
    pub(crate) fn color_at(&self, x: i32, y: i32) -> Pixel {
        if let PreparedKind::Solid(color) = self.kind {
            return color;
        }

        let point = self
            .to_pattern
            .apply_to(Vec2D::new(f64::from(x) + 0.5, f64::from(y) + 0.5));

        match &self.kind {
            PreparedKind::Solid(color) => *color,
            PreparedKind::Linear {
                start,
                direction,
                gradient,
            } => {
                let t = (point - *start).dot(*direction);
                self.gradient_color(gradient, t)
            },
            PreparedKind::Radial {
                start_center,
                start_radius,
                center_delta,
                radius_delta,
                gradient,
            } => {
                let t = radial_parameter(
                    point - *start_center,
                    *start_radius,
                    *center_delta,
                    *radius_delta,
                    self.extend == Extend::None,
                );
                t.map_or(TRANSPARENT, |t| self.gradient_color(gradient, t))
            },
            PreparedKind::Mesh(patches) => patches
                .iter()
                .rev()
                .find_map(|patch| {
                    patch
                        .parameters_of(point)
                        .map(|(u, v)| patch.color_at(u, v))
                })
                .unwrap_or(TRANSPARENT),
            PreparedKind::Surface(snapshot) => self.sample(snapshot, point),
        }
    }

    fn gradient_color(&self, gradient: &Gradient, t: f64) -> Pixel {
        if !t.is_finite() {
            return TRANSPARENT;
        }

        let t = match self.extend {
            Extend::None if !(0. ..=1.).contains(&t) => return TRANSPARENT,
            Extend::None => t,
            Extend::Pad => t.clamp(0., 1.),
            Extend::Repeat => t - t.floor(),
            Extend::Reflect => {
                let t = t.rem_euclid(2.);
                if t > 1. {
                    2. - t
                } else {
                    t
                }
            },
        };

        gradient.color_at(t).premultiplied()
    }

    /// Map an integer coordinate into `0..size` according to the extend mode
    fn extend_index(&self, index: i64, size: usize) -> Option<usize> {
        let size = size as i64;
        let index = match self.extend {
            Extend::None => {
                if !(0..size).contains(&index) {
                    return None;
                }
                index
            },
            Extend::Pad => index.clamp(0, size - 1),
            Extend::Repeat => index.rem_euclid(size),
            Extend::Reflect => {
                let index = index.rem_euclid(2 * size);
                if index >= size {
                    2 * size - 1 - index
                } else {
                    index
                }
            },
        };
        usize::try_from(index).ok()
    }

    fn texel(&self, snapshot: &Snapshot, x: i64, y: i64) -> Pixel {
        match (
            self.extend_index(x, snapshot.width()),
            self.extend_index(y, snapshot.height()),
        ) {
            (Some(x), Some(y)) => snapshot.pixel_at(x, y),
            _ => TRANSPARENT,
        }
    }

    fn sample(&self, snapshot: &Snapshot, point: Vec2D) -> Pixel {
        if snapshot.width() == 0 || snapshot.height() == 0 {
            return TRANSPARENT;
        }

        let point = snapshot.device_transform().apply_to(point);
        if !point.is_finite() {
            return TRANSPARENT;
        }

        match self.filter {
            Filter::Nearest => self.texel(snapshot, point.x.floor() as i64, point.y.floor() as i64),
            Filter::Bilinear => {
                let x = point.x - 0.5;
                let y = point.y - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let fx = (x - x0) as f32;
                let fy = (y - y0) as f32;
                let (x0, y0) = (x0 as i64, y0 as i64);

                let taps = [
                    (self.texel(snapshot, x0, y0), (1. - fx) * (1. - fy)),
                    (self.texel(snapshot, x0 + 1, y0), fx * (1. - fy)),
                    (self.texel(snapshot, x0, y0 + 1), (1. - fx) * fy),
                    (self.texel(snapshot, x0 + 1, y0 + 1), fx * fy),
                ];

                let mut result = [0.; 4];
                for (texel, weight) in taps {
                    for (channel, value) in result.iter_mut().zip(texel) {
                        *channel += value * weight;
                    }
                }
                result
            },
        }
    }
}

/// Solve for the gradient parameter of a two-circle radial gradient.
///
/// The circle at parameter `t` has its center at `start + t * center_delta` and
/// radius `start_radius + t * radius_delta`; the largest `t` whose circle passes
/// through the point (with a non-negative radius) is used. `offset` is the
/// position of the point relative to the start center.
fn radial_parameter(
    offset: Vec2D,
    start_radius: f64,
    center_delta: Vec2D,
    radius_delta: f64,
    restrict_to_unit: bool,
) -> Option<f64> {
    let a = center_delta.dot(center_delta) - radius_delta * radius_delta;
    let b = offset.dot(center_delta) + start_radius * radius_delta;
    let c = offset.dot(offset) - start_radius * start_radius;

    let is_valid = |t: f64| {
        t.is_finite()
            && start_radius + t * radius_delta >= 0.
            && (!restrict_to_unit || (0. ..=1.).contains(&t))
    };

    if a.abs() < f64::EPSILON * (b.abs() + c.abs()).max(1.) {
        // The circles touch, there is only one solution
        if b == 0. {
            return None;
        }
        return Some(c / (2. * b)).filter(|t| is_valid(*t));
    }

    let discriminant = b * b - a * c;
    if discriminant < 0. {
        return None;
    }

    let root = discriminant.sqrt();
    let (larger, smaller) = {
        let t1 = (b + root) / a;
        let t2 = (b - root) / a;
        if t1 >= t2 {
            (t1, t2)
        } else {
            (t2, t1)
        }
    };

    [larger, smaller].into_iter().find(|t| is_valid(*t))
}
