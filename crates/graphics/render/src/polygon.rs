//! Builds lists of directed edges from polylines

use math::{Fixed24Dot8, Rectangle, Vec2D};

use crate::path::Path;

pub type Fixed = Fixed24Dot8;

/// A point on the 1/256th pixel grid
pub type Point = Vec2D<Fixed>;

#[must_use]
pub fn point_from_f64(point: Vec2D) -> Point {
    point.map(Fixed::from_f64)
}

#[must_use]
pub fn point_to_f64(point: Point) -> Vec2D {
    point.map(Fixed::to_f64)
}

/// An infinite line through two points, with `p1.y < p2.y`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    /// The x coordinate at height `y`, rounded towards negative infinity
    #[must_use]
    pub fn x_at(&self, y: Fixed) -> Fixed {
        if y == self.p1.y {
            return self.p1.x;
        }
        if y == self.p2.y {
            return self.p2.x;
        }

        let dx = i64::from(self.p2.x.bits()) - i64::from(self.p1.x.bits());
        let dy = i64::from(self.p2.y.bits()) - i64::from(self.p1.y.bits());
        let offset = i64::from(y.bits()) - i64::from(self.p1.y.bits());

        // Coordinates are saturated to 30 bits, so the product can not overflow
        let x = i64::from(self.p1.x.bits()) + (offset * dx).div_euclid(dy);
        Fixed::from_bits(x.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }

    /// Return `true` if both lines lie on the same infinite line
    #[must_use]
    pub fn is_collinear_with(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }

        let bits = |point: Point| (i128::from(point.x.bits()), i128::from(point.y.bits()));
        let (x1, y1) = bits(self.p1);
        let (x2, y2) = bits(self.p2);
        let (dx, dy) = (x2 - x1, y2 - y1);

        [other.p1, other.p2].into_iter().all(|point| {
            let (x, y) = bits(point);
            dx * (y - y1) - dy * (x - x1) == 0
        })
    }

    /// Like [Line::x_at], but without rounding to the fixed point grid
    #[must_use]
    pub fn x_at_f64(&self, y: f64) -> f64 {
        let p1 = point_to_f64(self.p1);
        let p2 = point_to_f64(self.p2);
        p1.x + (y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y)
    }
}

/// A segment of a [Line], used by the sweep
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub line: Line,
    pub top: Fixed,
    pub bottom: Fixed,

    /// `1` if the original segment pointed downwards, `-1` otherwise
    pub direction: i32,

    /// Edges from different groups are tracked with separate winding numbers
    pub group: usize,
}

/// A set of closed outlines, described by their edges
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    edges: Vec<Edge>,
    extents: Option<Rectangle<Fixed>>,
}

impl Polygon {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the polygon filling a path.
    ///
    /// Every subpath is closed implicitly.
    #[must_use]
    pub fn from_path(path: &Path, tolerance: f64) -> Self {
        let mut polygon = Self::new();
        for polyline in path.flatten(tolerance) {
            polygon.add_polyline(&polyline.points);
        }
        polygon
    }

    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Bounding box of all edges, `None` if there are none
    #[inline]
    #[must_use]
    pub fn extents(&self) -> Option<Rectangle<Fixed>> {
        self.extents
    }

    /// Add a closed outline through all the given points
    pub fn add_polyline(&mut self, points: &[Vec2D]) {
        let points: Vec<Point> = points.iter().copied().map(point_from_f64).collect();
        self.add_fixed_polyline(&points);
    }

    pub fn add_fixed_polyline(&mut self, points: &[Point]) {
        if points.len() < 2 {
            return;
        }

        for pair in points.windows(2) {
            self.add_line(pair[0], pair[1], 0);
        }

        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            self.add_line(last, first, 0);
        }
    }

    /// Add the directed segment from `from` to `to`.
    ///
    /// Horizontal (and therefore also zero-length) segments never contribute to
    /// the winding number of any point and are dropped.
    pub fn add_line(&mut self, from: Point, to: Point, group: usize) {
        if from.y == to.y {
            return;
        }

        let (line, direction) = if from.y < to.y {
            (Line { p1: from, p2: to }, 1)
        } else {
            (Line { p1: to, p2: from }, -1)
        };

        self.add_edge(Edge {
            line,
            top: line.p1.y,
            bottom: line.p2.y,
            direction,
            group,
        });
    }

    /// Add an edge that only spans part of its line
    pub fn add_edge(&mut self, edge: Edge) {
        if edge.top >= edge.bottom {
            return;
        }

        let x_top = edge.line.x_at(edge.top);
        let x_bottom = edge.line.x_at(edge.bottom);
        let edge_extents = Rectangle::from_corners(
            Vec2D::new(x_top.min(x_bottom), edge.top),
            Vec2D::new(x_top.max(x_bottom), edge.bottom),
        );

        match &mut self.extents {
            Some(extents) => extents.grow_to_contain(edge_extents),
            None => self.extents = Some(edge_extents),
        }

        self.edges.push(edge);
    }

    /// Move every edge into the given winding group
    #[must_use]
    pub fn with_group(mut self, group: usize) -> Self {
        for edge in &mut self.edges {
            edge.group = group;
        }
        self
    }

    /// Add all edges of another polygon, keeping their groups
    pub fn append(&mut self, other: &Self) {
        for edge in &other.edges {
            self.add_edge(*edge);
        }
    }
}
