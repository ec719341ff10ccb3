//! Paths in device space

use math::{AffineTransform, Rectangle, Vec2D};

use crate::flatten::CubicBezier;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    /// A straight line to the given point
    Line(Vec2D),

    /// A cubic curve with two control points, ending at the last point
    Cubic(Vec2D, Vec2D, Vec2D),
}

impl Segment {
    #[must_use]
    pub fn end(&self) -> Vec2D {
        match self {
            Self::Line(end) | Self::Cubic(_, _, end) => *end,
        }
    }

    #[must_use]
    fn transformed(&self, transform: AffineTransform) -> Self {
        match self {
            Self::Line(end) => Self::Line(transform.apply_to(*end)),
            Self::Cubic(c1, c2, end) => Self::Cubic(
                transform.apply_to(*c1),
                transform.apply_to(*c2),
                transform.apply_to(*end),
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubPath {
    start: Vec2D,
    segments: Vec<Segment>,
    is_closed: bool,
}

impl SubPath {
    #[must_use]
    fn new(start: Vec2D) -> Self {
        Self {
            start,
            segments: vec![],
            is_closed: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn start(&self) -> Vec2D {
        self.start
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// The last point of the subpath, ignoring the implicit closing line
    #[must_use]
    pub fn end(&self) -> Vec2D {
        self.segments.last().map_or(self.start, Segment::end)
    }

    /// A subpath consisting of a single `move_to` does not draw anything
    #[inline]
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        !self.segments.is_empty() || self.is_closed
    }

    /// Approximate the subpath with straight lines
    #[must_use]
    pub fn flatten(&self, tolerance: f64) -> Polyline {
        let mut points = Vec::with_capacity(self.segments.len() + 1);
        points.push(self.start);

        let mut current = self.start;
        for segment in &self.segments {
            match *segment {
                Segment::Line(to) => points.push(to),
                Segment::Cubic(c1, c2, to) => {
                    CubicBezier::new(current, c1, c2, to).flatten(tolerance, &mut points)
                },
            }
            current = segment.end();
        }

        Polyline {
            points,
            is_closed: self.is_closed,
        }
    }
}

/// A flattened [SubPath]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec2D>,
    pub is_closed: bool,
}

/// A sequence of subpaths, in device coordinates.
///
/// Drawing operations without a current point behave like a `move_to`
/// to their first point. After [Path::close_path], the current point is the start of the
/// closed subpath and the next drawing operation starts a new subpath there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<SubPath>,
    current_point: Option<Vec2D>,
}

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    #[inline]
    #[must_use]
    pub fn current_point(&self) -> Option<Vec2D> {
        self.current_point
    }

    /// Return `true` if the path contains no drawable subpaths
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.subpaths.iter().any(SubPath::is_drawable)
    }

    pub fn clear(&mut self) {
        self.subpaths.clear();
        self.current_point = None;
    }

    pub fn move_to(&mut self, point: Vec2D) {
        // Consecutive move_to's only keep the last point
        match self.subpaths.last_mut() {
            Some(subpath) if !subpath.is_drawable() => subpath.start = point,
            _ => self.subpaths.push(SubPath::new(point)),
        }
        self.current_point = Some(point);
    }

    /// Forget the current point without starting a new subpath yet
    pub fn new_sub_path(&mut self) {
        self.current_point = None;
    }

    /// Return the subpath new segments should be appended to, starting
    /// a new one if necessary
    fn open_subpath(&mut self, current_point: Vec2D) -> &mut SubPath {
        let needs_new_subpath = self
            .subpaths
            .last()
            .map_or(true, |subpath| subpath.is_closed);

        if needs_new_subpath {
            self.subpaths.push(SubPath::new(current_point));
        }

        let index = self.subpaths.len() - 1;
        &mut self.subpaths[index]
    }

    pub fn line_to(&mut self, point: Vec2D) {
        let Some(current_point) = self.current_point else {
            self.move_to(point);
            return;
        };

        self.open_subpath(current_point)
            .segments
            .push(Segment::Line(point));
        self.current_point = Some(point);
    }

    pub fn curve_to(&mut self, control1: Vec2D, control2: Vec2D, point: Vec2D) {
        let current_point = match self.current_point {
            Some(current_point) => current_point,
            None => {
                self.move_to(control1);
                control1
            },
        };

        self.open_subpath(current_point)
            .segments
            .push(Segment::Cubic(control1, control2, point));
        self.current_point = Some(point);
    }

    pub fn close_path(&mut self) {
        if self.current_point.is_none() {
            return;
        }

        if let Some(subpath) = self.subpaths.last_mut() {
            subpath.is_closed = true;
            self.current_point = Some(subpath.start);
        }
    }

    /// Append all subpaths of another path
    pub fn extend(&mut self, other: &Self) {
        self.subpaths.extend(other.subpaths.iter().cloned());
        self.current_point = other.current_point;
    }

    /// Apply a transform to every point in the path
    #[must_use]
    pub fn transformed(&self, transform: AffineTransform) -> Self {
        let subpaths = self
            .subpaths
            .iter()
            .map(|subpath| SubPath {
                start: transform.apply_to(subpath.start),
                segments: subpath
                    .segments
                    .iter()
                    .map(|segment| segment.transformed(transform))
                    .collect(),
                is_closed: subpath.is_closed,
            })
            .collect();

        Self {
            subpaths,
            current_point: self.current_point.map(|p| transform.apply_to(p)),
        }
    }

    /// Approximate every drawable subpath with straight lines
    #[must_use]
    pub fn flatten(&self, tolerance: f64) -> Vec<Polyline> {
        self.subpaths
            .iter()
            .filter(|subpath| subpath.is_drawable())
            .map(|subpath| subpath.flatten(tolerance))
            .collect()
    }

    /// A copy of the path where every curve is replaced by straight lines
    #[must_use]
    pub fn flattened(&self, tolerance: f64) -> Self {
        let subpaths = self
            .subpaths
            .iter()
            .map(|subpath| {
                let polyline = subpath.flatten(tolerance);
                SubPath {
                    start: subpath.start,
                    segments: polyline.points[1..]
                        .iter()
                        .copied()
                        .map(Segment::Line)
                        .collect(),
                    is_closed: subpath.is_closed,
                }
            })
            .collect();

        Self {
            subpaths,
            current_point: self.current_point,
        }
    }

    /// The bounding box of the flattened path, including degenerate subpaths
    #[must_use]
    pub fn extents(&self, tolerance: f64) -> Option<Rectangle> {
        Rectangle::bounding_box(
            self.flatten(tolerance)
                .into_iter()
                .flat_map(|polyline| polyline.points),
        )
    }
}
