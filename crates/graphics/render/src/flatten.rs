//! Reduces curves and arcs to polylines.

use std::f64::consts::{PI, TAU};

use math::Vec2D;

/// Cubic curves are subdivided at most this many times
///
/// This bounds the number of line segments per curve to `2^MAX_SUBDIVISION_DEPTH`,
/// even for curves with control points at infinity.
pub const MAX_SUBDIVISION_DEPTH: u32 = 16;

/// Arcs sweeping more than this many full turns are clamped to a single turn
pub const MAX_FULL_TURNS: f64 = 65536.;

/// Arcs are never split into segments smaller than `PI / MAX_ARC_DIVISIONS`
const MAX_ARC_DIVISIONS: usize = 1024;

/// Upper bound on the number of cubics a single arc produces.
///
/// Large enough that even a sweep of [MAX_FULL_TURNS] turns can use quarter turn segments.
pub const MAX_ARC_SEGMENTS: usize = 4 * MAX_FULL_TURNS as usize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub start: Vec2D,
    pub control1: Vec2D,
    pub control2: Vec2D,
    pub end: Vec2D,
}

impl CubicBezier {
    #[must_use]
    pub const fn new(start: Vec2D, control1: Vec2D, control2: Vec2D, end: Vec2D) -> Self {
        Self {
            start,
            control1,
            control2,
            end,
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.start.is_finite()
            && self.control1.is_finite()
            && self.control2.is_finite()
            && self.end.is_finite()
    }

    /// Split the curve at `t = 0.5` using de Casteljau's algorithm
    #[must_use]
    pub fn split(&self) -> (Self, Self) {
        let ab = Vec2D::middle(self.start, self.control1);
        let bc = Vec2D::middle(self.control1, self.control2);
        let cd = Vec2D::middle(self.control2, self.end);
        let abc = Vec2D::middle(ab, bc);
        let bcd = Vec2D::middle(bc, cd);
        let midpoint = Vec2D::middle(abc, bcd);

        (
            Self::new(self.start, ab, abc, midpoint),
            Self::new(midpoint, bcd, cd, self.end),
        )
    }

    /// Return `true` if the curve deviates from the straight line between its
    /// endpoints by no more than `tolerance`.
    #[must_use]
    pub fn is_flat(&self, tolerance: f64) -> bool {
        // The maximum distance between the curve and its chord is bounded by
        // a quarter of the distance between the control points and the
        // points on the chord at t=1/3 and t=2/3
        let u = self.control1 * 3. - self.start * 2. - self.end;
        let v = self.control2 * 3. - self.end * 2. - self.start;

        let deviation = (u.x * u.x).max(v.x * v.x) + (u.y * u.y).max(v.y * v.y);
        deviation <= 16. * tolerance * tolerance
    }

    /// Append line segments approximating the curve to `output`.
    ///
    /// The start point is not emitted, the last point emitted is always `end`.
    pub fn flatten(&self, tolerance: f64, output: &mut Vec<Vec2D>) {
        if !self.is_finite() || !(tolerance > 0.) {
            output.push(self.end);
            return;
        }

        self.flatten_recursive(tolerance, MAX_SUBDIVISION_DEPTH, output);
    }

    fn flatten_recursive(&self, tolerance: f64, remaining_depth: u32, output: &mut Vec<Vec2D>) {
        if remaining_depth == 0 || self.is_flat(tolerance) {
            output.push(self.end);
            return;
        }

        let (first, second) = self.split();
        first.flatten_recursive(tolerance, remaining_depth - 1, output);
        second.flatten_recursive(tolerance, remaining_depth - 1, output);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArcDirection {
    /// Angles increase, from the positive x axis towards the positive y axis
    Positive,
    Negative,
}

/// A circular arc, in the same coordinate space as its center
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc {
    pub center: Vec2D,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Arc {
    /// Create an arc, normalizing the angles so that the arc sweeps in `direction`.
    ///
    /// For [ArcDirection::Positive], if `end_angle < start_angle` then `end_angle` is
    /// increased by multiples of a full turn until it is not. Sweeps of more than
    /// [MAX_FULL_TURNS] turns (or non-finite sweeps) are reduced to a single turn.
    ///
    /// Returns `None` if the start angle is not finite.
    #[must_use]
    pub fn new(
        center: Vec2D,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        direction: ArcDirection,
    ) -> Option<Self> {
        if !start_angle.is_finite() {
            log::debug!("Ignoring arc with non-finite start angle {start_angle}");
            return None;
        }

        let mut sweep = match direction {
            ArcDirection::Positive => end_angle - start_angle,
            ArcDirection::Negative => start_angle - end_angle,
        };

        if !sweep.is_finite() || sweep > TAU * MAX_FULL_TURNS {
            log::debug!("Clamping arc sweep of {sweep} radians to a full turn");
            sweep = TAU;
        } else if sweep < 0. {
            sweep = sweep.rem_euclid(TAU);
        }

        let end_angle = match direction {
            ArcDirection::Positive => start_angle + sweep,
            ArcDirection::Negative => start_angle - sweep,
        };

        Some(Self {
            center,
            radius,
            start_angle,
            end_angle,
        })
    }

    #[must_use]
    pub fn point_at(&self, angle: f64) -> Vec2D {
        self.center + Vec2D::new(angle.cos(), angle.sin()) * self.radius
    }

    #[must_use]
    pub fn start_point(&self) -> Vec2D {
        self.point_at(self.start_angle)
    }

    #[must_use]
    pub fn end_point(&self) -> Vec2D {
        self.point_at(self.end_angle)
    }

    /// Approximate the arc with cubic curves.
    ///
    /// Each curve spans at most a quarter turn, fewer if that is required to
    /// stay within `tolerance` of the true circle.
    #[must_use]
    pub fn to_cubics(&self, tolerance: f64) -> Vec<CubicBezier> {
        let sweep = self.end_angle - self.start_angle;
        if !(self.radius > 0.) || sweep == 0. {
            return vec![];
        }

        let max_angle = max_angle_for_tolerance(tolerance / self.radius);
        let mut num_segments = (sweep.abs() / max_angle).ceil().max(1.);
        if num_segments > MAX_ARC_SEGMENTS as f64 {
            log::debug!(
                "Approximating arc with {MAX_ARC_SEGMENTS} segments instead of {num_segments}"
            );
            num_segments = MAX_ARC_SEGMENTS as f64;
        }
        let step = sweep / num_segments;

        let num_segments = num_segments as usize;
        let mut cubics = Vec::with_capacity(num_segments);
        let mut angle = self.start_angle;
        for index in 0..num_segments {
            let next_angle = if index + 1 == num_segments {
                self.end_angle
            } else {
                angle + step
            };
            cubics.push(self.segment(angle, next_angle));
            angle = next_angle;
        }
        cubics
    }

    /// A single cubic approximating the arc from angle `a` to `b` (`|b - a| <= PI / 2`)
    fn segment(&self, a: f64, b: f64) -> CubicBezier {
        let (sin_a, cos_a) = (self.radius * a.sin(), self.radius * a.cos());
        let (sin_b, cos_b) = (self.radius * b.sin(), self.radius * b.cos());
        let h = 4. / 3. * ((b - a) / 4.).tan();

        let c = self.center;
        CubicBezier::new(
            c + Vec2D::new(cos_a, sin_a),
            c + Vec2D::new(cos_a - h * sin_a, sin_a + h * cos_a),
            c + Vec2D::new(cos_b + h * sin_b, sin_b - h * cos_b),
            c + Vec2D::new(cos_b, sin_b),
        )
    }
}

/// Maximum deviation of a single cubic approximating an arc of the unit circle
/// with the given angle
fn arc_error(angle: f64) -> f64 {
    let quarter = angle / 4.;
    2. / 27. * quarter.sin().powi(6) / quarter.cos().powi(2)
}

/// The largest angle `PI / n` (`n >= 2`) whose arc approximation error on the unit
/// circle is below `tolerance`
fn max_angle_for_tolerance(tolerance: f64) -> f64 {
    (2..=MAX_ARC_DIVISIONS)
        .map(|divisions| PI / divisions as f64)
        .find(|angle| arc_error(*angle) <= tolerance)
        .unwrap_or(PI / MAX_ARC_DIVISIONS as f64)
}

/// Number of points needed to approximate a full circle of `radius` within `tolerance`
///
/// The result is even, at least four and never larger than `2 * MAX_ARC_DIVISIONS`.
#[must_use]
pub fn circle_vertices_needed(radius: f64, tolerance: f64) -> usize {
    const MIN_VERTICES: usize = 4;

    if !(radius > tolerance) || !tolerance.is_finite() {
        return MIN_VERTICES;
    }

    let delta = (1. - tolerance / radius).acos();
    if !(delta > 0.) {
        return 2 * MAX_ARC_DIVISIONS;
    }

    let needed = (TAU / delta).ceil().min((2 * MAX_ARC_DIVISIONS) as f64) as usize;
    let even = needed + needed % 2;
    even.max(MIN_VERTICES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance_to_segment(point: Vec2D, a: Vec2D, b: Vec2D) -> f64 {
        let ab = b - a;
        let t = ((point - a).dot(ab) / ab.dot(ab)).clamp(0., 1.);
        point.distance_to(a.lerp(b, t))
    }

    #[test]
    fn flat_cubic_is_a_single_line() {
        let line = CubicBezier::new(
            Vec2D::new(0., 0.),
            Vec2D::new(1., 0.),
            Vec2D::new(2., 0.),
            Vec2D::new(3., 0.),
        );

        let mut points = vec![];
        line.flatten(0.1, &mut points);
        assert_eq!(points, vec![Vec2D::new(3., 0.)]);
    }

    #[test]
    fn flattened_curve_stays_within_tolerance() {
        let curve = CubicBezier::new(
            Vec2D::new(0., 0.),
            Vec2D::new(0., 100.),
            Vec2D::new(100., 100.),
            Vec2D::new(100., 0.),
        );
        let tolerance = 0.25;

        let mut points = vec![curve.start];
        curve.flatten(tolerance, &mut points);
        assert!(points.len() > 2);
        assert_eq!(points.last(), Some(&curve.end));

        // Sample the true curve and make sure every sample is close to the polyline
        for i in 0..=100 {
            let t = f64::from(i) / 100.;
            let mt = 1. - t;
            let sample = curve.start * (mt * mt * mt)
                + curve.control1 * (3. * mt * mt * t)
                + curve.control2 * (3. * mt * t * t)
                + curve.end * (t * t * t);

            let distance = points
                .windows(2)
                .map(|line| distance_to_segment(sample, line[0], line[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(distance <= tolerance, "{distance} exceeds the tolerance");
        }
    }

    #[test]
    fn non_finite_curve_terminates() {
        let curve = CubicBezier::new(
            Vec2D::new(0., 0.),
            Vec2D::new(f64::INFINITY, 0.),
            Vec2D::new(f64::NAN, 1.),
            Vec2D::new(1., 1.),
        );

        let mut points = vec![];
        curve.flatten(0.1, &mut points);
        assert_eq!(points, vec![Vec2D::new(1., 1.)]);
    }

    #[test]
    fn huge_curve_is_bounded_by_depth() {
        let curve = CubicBezier::new(
            Vec2D::new(0., 0.),
            Vec2D::new(1e300, 0.),
            Vec2D::new(-1e300, 1e300),
            Vec2D::new(1., 1.),
        );

        let mut points = vec![];
        curve.flatten(1e-9, &mut points);
        assert!(points.len() <= 1 << MAX_SUBDIVISION_DEPTH);
    }

    #[test]
    fn arc_angles_are_normalized() {
        let arc = Arc::new(Vec2D::default(), 1., PI, 0., ArcDirection::Positive)
            .expect("start angle is finite");
        assert!((arc.end_angle - TAU).abs() < 1e-12);

        let arc = Arc::new(Vec2D::default(), 1., 0., PI, ArcDirection::Negative)
            .expect("start angle is finite");
        assert!((arc.end_angle + PI).abs() < 1e-12);
    }

    #[test]
    fn huge_sweep_is_clamped() {
        let sweep = 1024. / f64::EPSILON * PI;
        let arc = Arc::new(Vec2D::default(), 10., 0., sweep, ArcDirection::Positive)
            .expect("start angle is finite");
        assert_eq!(arc.end_angle, TAU);

        let cubics = arc.to_cubics(0.1);
        assert!(!cubics.is_empty());
        assert!(cubics.len() <= 2 * MAX_ARC_DIVISIONS);

        let arc = Arc::new(Vec2D::default(), 10., 0., f64::NAN, ArcDirection::Positive)
            .expect("start angle is finite");
        assert_eq!(arc.end_angle, TAU);
    }

    #[test]
    fn many_turns_at_tight_tolerance_are_bounded() {
        let arc = Arc::new(
            Vec2D::default(),
            10.,
            0.,
            TAU * 60000.,
            ArcDirection::Positive,
        )
        .expect("start angle is finite");

        let cubics = arc.to_cubics(1e-6);
        assert_eq!(cubics.len(), MAX_ARC_SEGMENTS);

        // Each segment still spans less than a quarter turn
        let max_chord = 10. * 2_f64.sqrt() + 1e-9;
        assert!(cubics
            .iter()
            .all(|cubic| cubic.start.distance_to(cubic.end) <= max_chord));

        let last = cubics[cubics.len() - 1];
        assert!(last.end.distance_to(arc.end_point()) < 1e-9);
    }

    #[test]
    fn arc_segments_span_at_most_a_quarter_turn() {
        let arc = Arc::new(Vec2D::new(5., 5.), 1000., 0., TAU, ArcDirection::Positive)
            .expect("start angle is finite");

        // A huge tolerance still splits the circle into quarters
        assert_eq!(arc.to_cubics(1e6).len(), 4);

        // A tight tolerance needs more segments
        let cubics = arc.to_cubics(0.01);
        assert!(cubics.len() > 4);

        let first = cubics[0];
        let last = cubics[cubics.len() - 1];
        assert!(first.start.distance_to(Vec2D::new(1005., 5.)) < 1e-9);
        assert!(last.end.distance_to(Vec2D::new(1005., 5.)) < 1e-9);
    }

    #[test]
    fn zero_radius_arc_has_no_segments() {
        let arc = Arc::new(Vec2D::new(1., 1.), 0., 0., PI, ArcDirection::Positive)
            .expect("start angle is finite");
        assert!(arc.to_cubics(0.1).is_empty());
        assert_eq!(arc.start_point(), Vec2D::new(1., 1.));
    }

    #[test]
    fn circle_vertex_count() {
        assert_eq!(circle_vertices_needed(0.05, 0.1), 4);
        let small = circle_vertices_needed(10., 0.1);
        let large = circle_vertices_needed(1000., 0.1);
        assert!(small >= 4 && small % 2 == 0);
        assert!(large > small);
        assert!(circle_vertices_needed(1e12, 1e-12) <= 2 * MAX_ARC_DIVISIONS);
    }
}
