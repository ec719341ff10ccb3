//! Converts strokes into fillable outlines.
//!
//! Strokes are built in user space, where the pen is round, and every
//! piece of the outline (segment bodies, joins, caps) is emitted as a separate
//! closed polygon. All pieces are oriented the same way once mapped to device
//! space, so filling them with the non-zero rule gives their union.

use std::f64::consts::TAU;

use math::{AffineTransform, Vec2D};

use crate::{
    flatten::circle_vertices_needed,
    path::{Path, Polyline},
    polygon::Polygon,
    Error, Result,
};

/// Upper bound on the number of dashes generated for a single polyline
const MAX_DASHES: usize = 1 << 16;

/// The shape used at the ends of open subpaths
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    /// Stop exactly at the end point
    #[default]
    Butt,

    /// A half circle centered on the end point
    Round,

    /// Extend the line by half its width
    Square,
}

/// The shape used where two segments meet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    /// Extend the outer edges until they meet, unless the miter limit is exceeded
    #[default]
    Miter,

    Round,

    /// Cut off the corner with a straight line
    Bevel,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,

    /// The longest allowed ratio between miter length and line width
    pub miter_limit: f64,
    dash: Vec<f64>,
    dash_offset: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            line_width: 2.,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 10.,
            dash: vec![],
            dash_offset: 0.,
        }
    }
}

impl StrokeStyle {
    /// Set the dash pattern, alternating between "on" and "off" lengths.
    ///
    /// An empty pattern disables dashing. Negative lengths, or a pattern where
    /// every length is zero, are rejected.
    pub fn set_dash(&mut self, dashes: &[f64], offset: f64) -> Result<()> {
        if dashes.iter().any(|&dash| !(dash >= 0. && dash.is_finite())) {
            return Err(Error::InvalidDash);
        }

        if !dashes.is_empty() && dashes.iter().all(|&dash| dash == 0.) {
            return Err(Error::InvalidDash);
        }

        self.dash = dashes.to_vec();
        self.dash_offset = if offset.is_finite() { offset } else { 0. };
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn dash(&self) -> &[f64] {
        &self.dash
    }

    #[inline]
    #[must_use]
    pub fn dash_offset(&self) -> f64 {
        self.dash_offset
    }

    #[inline]
    #[must_use]
    pub fn is_dashed(&self) -> bool {
        !self.dash.is_empty()
    }
}

/// Compute the outline of the stroke of `path`.
///
/// `path` is in device space, `ctm` maps the user space the stroke style is
/// measured in to device space. The result must be filled with
/// [FillRule::Winding](crate::FillRule::Winding).
#[must_use]
pub fn stroke_to_polygon(
    path: &Path,
    style: &StrokeStyle,
    ctm: AffineTransform,
    tolerance: f64,
) -> Polygon {
    let mut polygon = Polygon::new();

    let half_width = style.line_width / 2.;
    if !(half_width > 0.) {
        return polygon;
    }

    let Some(ctm_inverse) = ctm.inverse() else {
        return polygon;
    };

    let max_scale = ctm.max_scale_factor();
    let user_tolerance = tolerance / max_scale;
    if !(user_tolerance > 0.) || !user_tolerance.is_finite() {
        return polygon;
    }

    let mut stroker = Stroker {
        style,
        half_width,
        circle_vertices: circle_vertices_needed(half_width * max_scale, tolerance),
        outlines: vec![],
    };

    let dash = Dash::new(style, max_scale, tolerance);
    for polyline in path.transformed(ctm_inverse).flatten(user_tolerance) {
        let polyline = remove_duplicate_points(polyline);

        let dashed = dash.as_ref().and_then(|dash| {
            let pieces = dash.apply(&polyline);
            if pieces.is_none() {
                log::debug!("Too many dashes, stroking subpath without dashing");
            }
            pieces
        });

        match dashed {
            Some(pieces) => {
                for piece in &pieces {
                    stroker.add_piece(piece);
                }
            },
            None => stroker.add_piece(&Piece {
                points: polyline.points,
                is_closed: polyline.is_closed,
                direction_hint: None,
            }),
        }
    }

    for outline in stroker.outlines {
        let mut outline: Vec<Vec2D> = outline.into_iter().map(|p| ctm.apply_to(p)).collect();
        let area = signed_area(&outline);
        if area == 0. || !area.is_finite() {
            continue;
        }

        if area < 0. {
            outline.reverse();
        }
        polygon.add_polyline(&outline);
    }

    polygon
}

/// Twice the signed area enclosed by the closed outline
fn signed_area(points: &[Vec2D]) -> f64 {
    let Some(&last) = points.last() else {
        return 0.;
    };

    let mut previous = last;
    let mut area = 0.;
    for &point in points {
        area += previous.cross_product(point);
        previous = point;
    }
    area
}

fn remove_duplicate_points(mut polyline: Polyline) -> Polyline {
    polyline.points.dedup();

    // An explicit line back to the start of a closed subpath is the same
    // as the implicit one
    if polyline.is_closed
        && polyline.points.len() > 1
        && polyline.points.first() == polyline.points.last()
    {
        polyline.points.pop();
    }
    polyline
}

/// A polyline that is stroked as a whole
#[derive(Clone, Debug, PartialEq)]
struct Piece {
    points: Vec<Vec2D>,
    is_closed: bool,

    /// Orientation of square caps on pieces without length
    direction_hint: Option<Vec2D>,
}

impl Piece {
    fn starting_at(point: Vec2D, direction: Vec2D) -> Self {
        Self {
            points: vec![point],
            is_closed: false,
            direction_hint: Some(direction),
        }
    }
}

/// A dash pattern resolved against its offset
#[derive(Clone, Debug)]
struct Dash {
    /// Always contains an even number of lengths
    dashes: Vec<f64>,
    start_index: usize,
    start_remaining: f64,
    start_on: bool,
}

impl Dash {
    /// Returns `None` if the stroke is not dashed, or if the pattern is
    /// too fine to make a visible difference
    fn new(style: &StrokeStyle, max_scale: f64, tolerance: f64) -> Option<Self> {
        if !style.is_dashed() {
            return None;
        }

        let mut dashes = style.dash().to_vec();
        if dashes.len() % 2 == 1 {
            dashes.extend_from_slice(style.dash());
        }

        let period: f64 = dashes.iter().sum();
        if !(period * max_scale >= tolerance) {
            log::debug!("Dash period {period} is below the tolerance, stroking without dashing");
            return None;
        }

        let mut offset = style.dash_offset().rem_euclid(period);
        let mut index = 0;
        let mut on = true;
        for _ in 0..dashes.len() {
            if !(offset > 0. && offset >= dashes[index]) {
                break;
            }
            offset -= dashes[index];
            on = !on;
            index = (index + 1) % dashes.len();
        }

        Some(Self {
            start_remaining: (dashes[index] - offset).max(0.),
            dashes,
            start_index: index,
            start_on: on,
        })
    }

    /// Split a polyline into its "on" pieces.
    ///
    /// Returns `None` if the polyline would be split into too many pieces.
    fn apply(&self, polyline: &Polyline) -> Option<Vec<Piece>> {
        let points = &polyline.points;
        let Some(&first) = points.first() else {
            return Some(vec![]);
        };

        if points.len() == 1 {
            let dot = Piece {
                points: vec![first],
                is_closed: false,
                direction_hint: None,
            };
            return Some(if self.start_on { vec![dot] } else { vec![] });
        }

        let closing_segment = polyline.is_closed.then(|| (points[points.len() - 1], first));
        let segments = points
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .chain(closing_segment);

        let mut pieces = vec![];
        let mut current: Option<Piece> = None;
        let mut index = self.start_index;
        let mut remaining = self.start_remaining;
        let mut on = self.start_on;
        let mut has_toggled = false;

        for (from, to) in segments {
            let Some(direction) = (to - from).normalized() else {
                continue;
            };
            let length = from.distance_to(to);

            if on && current.is_none() {
                current = Some(Piece::starting_at(from, direction));
            }

            let mut travelled = 0.;
            loop {
                let left = length - travelled;
                if remaining > left {
                    remaining -= left;
                    if let Some(piece) = current.as_mut() {
                        piece.points.push(to);
                    }
                    break;
                }

                travelled += remaining;
                let point = from + direction * travelled;
                if on {
                    if let Some(mut piece) = current.take() {
                        piece.points.push(point);
                        pieces.push(piece);
                    }
                } else {
                    current = Some(Piece::starting_at(point, direction));
                }

                on = !on;
                has_toggled = true;
                index = (index + 1) % self.dashes.len();
                remaining = self.dashes[index];

                if pieces.len() > MAX_DASHES {
                    return None;
                }
            }
        }

        if polyline.is_closed && !has_toggled {
            // The pattern never changed state along the outline
            if !self.start_on {
                return Some(vec![]);
            }
            return Some(vec![Piece {
                points: points.clone(),
                is_closed: true,
                direction_hint: None,
            }]);
        }

        if let Some(piece) = current {
            pieces.push(piece);
        }

        // On closed subpaths, the dash crossing the start point is a single piece
        if polyline.is_closed && self.start_on && on && pieces.len() > 1 {
            let first_piece = pieces.remove(0);
            if let Some(last_piece) = pieces.last_mut() {
                last_piece.points.extend_from_slice(&first_piece.points[1..]);
            }
        }

        Some(pieces)
    }
}

struct Stroker<'a> {
    style: &'a StrokeStyle,
    half_width: f64,
    circle_vertices: usize,

    /// Closed outlines in user space, with arbitrary orientation
    outlines: Vec<Vec<Vec2D>>,
}

impl<'a> Stroker<'a> {
    fn add_piece(&mut self, piece: &Piece) {
        let mut points = piece.points.clone();
        points.dedup();
        if piece.is_closed && points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        let count = points.len();
        match count {
            0 => return,
            1 => {
                self.add_dot(points[0], piece.direction_hint);
                return;
            },
            _ => {},
        }

        let segment_count = if piece.is_closed { count } else { count - 1 };
        for index in 0..segment_count {
            self.add_segment(points[index], points[(index + 1) % count]);
        }

        if piece.is_closed {
            for index in 0..count {
                self.add_join(
                    points[(index + count - 1) % count],
                    points[index],
                    points[(index + 1) % count],
                );
            }
        } else {
            for window in points.windows(3) {
                self.add_join(window[0], window[1], window[2]);
            }

            self.add_cap(points[0], points[1]);
            self.add_cap(points[count - 1], points[count - 2]);
        }
    }

    fn add_segment(&mut self, from: Vec2D, to: Vec2D) {
        let Some(direction) = (to - from).normalized() else {
            return;
        };

        let normal = direction.perpendicular() * self.half_width;
        self.outlines
            .push(vec![from + normal, to + normal, to - normal, from - normal]);
    }

    /// Fill the gap on the outer side of the corner at `vertex`
    fn add_join(&mut self, previous: Vec2D, vertex: Vec2D, next: Vec2D) {
        let (Some(incoming), Some(outgoing)) = (
            (vertex - previous).normalized(),
            (next - vertex).normalized(),
        ) else {
            return;
        };

        let cross = incoming.cross_product(outgoing);
        if cross == 0. && incoming.dot(outgoing) > 0. {
            // Straight continuation
            return;
        }

        if self.style.line_join == LineJoin::Round {
            self.add_circle(vertex);
            return;
        }

        if cross == 0. {
            // The line reverses, there is no outer side to fill
            return;
        }

        let side = -cross.signum() * self.half_width;
        let a = vertex + incoming.perpendicular() * side;
        let b = vertex + outgoing.perpendicular() * side;

        if self.style.line_join == LineJoin::Miter {
            // Compare the miter length against the limit without taking roots:
            // miter_length / line_width = 1 / sin(theta / 2)
            let in_dot_out = -incoming.dot(outgoing);
            let limit = self.style.miter_limit;
            if 2. <= limit * limit * (1. - in_dot_out) {
                let t = (b - a).cross_product(outgoing) / cross;
                let miter = a + incoming * t;
                if miter.is_finite() {
                    self.outlines.push(vec![vertex, a, miter, b]);
                    return;
                }
            }
        }

        self.outlines.push(vec![vertex, a, b]);
    }

    /// Add a cap at `end`, for a line coming from `neighbour`
    fn add_cap(&mut self, end: Vec2D, neighbour: Vec2D) {
        let Some(direction) = (end - neighbour).normalized() else {
            return;
        };

        match self.style.line_cap {
            LineCap::Butt => {},
            LineCap::Round => self.add_circle(end),
            LineCap::Square => {
                let forward = direction * self.half_width;
                let normal = direction.perpendicular() * self.half_width;
                self.outlines.push(vec![
                    end + normal,
                    end + normal + forward,
                    end - normal + forward,
                    end - normal,
                ]);
            },
        }
    }

    /// Caps for a subpath without length
    fn add_dot(&mut self, center: Vec2D, direction_hint: Option<Vec2D>) {
        match self.style.line_cap {
            LineCap::Butt => {},
            LineCap::Round => self.add_circle(center),
            LineCap::Square => {
                let direction = direction_hint.unwrap_or(Vec2D::new(1., 0.));
                let forward = direction * self.half_width;
                let normal = direction.perpendicular() * self.half_width;
                self.outlines.push(vec![
                    center - forward + normal,
                    center + forward + normal,
                    center + forward - normal,
                    center - forward - normal,
                ]);
            },
        }
    }

    fn add_circle(&mut self, center: Vec2D) {
        let vertices = self.circle_vertices;
        let outline = (0..vertices)
            .map(|index| {
                let angle = TAU * index as f64 / vertices as f64;
                center + Vec2D::new(angle.cos(), angle.sin()) * self.half_width
            })
            .collect();
        self.outlines.push(outline);
    }
}
