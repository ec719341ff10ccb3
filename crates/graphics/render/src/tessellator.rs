//! Converts polygons into non-overlapping trapezoids.
//!
//! The sweep walks down the polygon in horizontal bands. A band ends
//! wherever an edge starts, ends or crosses one of its neighbours, so inside a
//! band the order of the active edges never changes and every span between two
//! of them is a trapezoid.

use math::{Rectangle, Vec2D};

use crate::polygon::{point_to_f64, Edge, Fixed, Line, Point, Polygon};

/// Decides whether a winding number lies inside or outside of a shape
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
    /// Everything with a non-zero winding number is inside
    #[default]
    Winding,

    /// Everything with an odd winding number is inside
    EvenOdd,
}

impl FillRule {
    #[inline]
    #[must_use]
    pub fn is_inside(&self, winding: i32) -> bool {
        match self {
            Self::Winding => winding != 0,
            Self::EvenOdd => winding % 2 != 0,
        }
    }
}

/// A horizontal strip bounded on the left and right by two lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trapezoid {
    pub top: Fixed,
    pub bottom: Fixed,
    pub left: Line,
    pub right: Line,

    /// The winding number inside the trapezoid
    pub winding: i32,
}

impl Trapezoid {
    #[must_use]
    pub fn contains_point(&self, point: Vec2D) -> bool {
        if !(self.top.to_f64() <= point.y && point.y < self.bottom.to_f64()) {
            return false;
        }

        self.left.x_at_f64(point.y) <= point.x && point.x < self.right.x_at_f64(point.y)
    }

    #[must_use]
    pub fn extents(&self) -> Rectangle<Fixed> {
        let xs = [
            self.left.x_at(self.top),
            self.left.x_at(self.bottom),
            self.right.x_at(self.top),
            self.right.x_at(self.bottom),
        ];

        let left = xs.iter().copied().min().unwrap_or(Fixed::ZERO);
        let right = xs.iter().copied().max().unwrap_or(Fixed::ZERO);
        Rectangle::from_corners(Vec2D::new(left, self.top), Vec2D::new(right, self.bottom))
    }
}

/// The output of one tessellation pass.
///
/// Trapezoids never overlap and are sorted by their top edge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Traps {
    traps: Vec<Trapezoid>,
    extents: Option<Rectangle<Fixed>>,
}

impl Traps {
    fn from_trapezoids(traps: Vec<Trapezoid>) -> Self {
        let extents = traps.iter().map(Trapezoid::extents).reduce(|mut a, b| {
            a.grow_to_contain(b);
            a
        });

        Self { traps, extents }
    }

    /// A single axis-aligned rectangle
    #[must_use]
    pub fn from_rectangle(rectangle: Rectangle<Fixed>) -> Self {
        if rectangle.is_degenerate() {
            return Self::default();
        }

        let top_left = rectangle.top_left();
        let bottom_right = rectangle.bottom_right();
        let vertical = |x: Fixed| Line {
            p1: Point::new(x, top_left.y),
            p2: Point::new(x, bottom_right.y),
        };

        Self::from_trapezoids(vec![Trapezoid {
            top: top_left.y,
            bottom: bottom_right.y,
            left: vertical(top_left.x),
            right: vertical(bottom_right.x),
            winding: 1,
        }])
    }

    #[inline]
    #[must_use]
    pub fn traps(&self) -> &[Trapezoid] {
        &self.traps
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.traps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traps.is_empty()
    }

    /// The tight bounding box of all trapezoids, `None` if there are none
    #[inline]
    #[must_use]
    pub fn extents(&self) -> Option<Rectangle<Fixed>> {
        self.extents
    }

    #[must_use]
    pub fn extents_f64(&self) -> Option<Rectangle> {
        self.extents.map(|extents| {
            Rectangle::from_corners(
                point_to_f64(extents.top_left()),
                point_to_f64(extents.bottom_right()),
            )
        })
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec2D) -> bool {
        self.traps.iter().any(|trap| trap.contains_point(point))
    }

    /// Turn the trapezoids back into edges, so they can be fed into another sweep
    #[must_use]
    pub fn to_polygon(&self, group: usize) -> Polygon {
        let mut polygon = Polygon::new();
        for trap in &self.traps {
            for (line, direction) in [(trap.left, 1), (trap.right, -1)] {
                polygon.add_edge(Edge {
                    line,
                    top: trap.top,
                    bottom: trap.bottom,
                    direction,
                    group,
                });
            }
        }
        polygon
    }
}

/// Compute the area covered by `polygon` under the given fill rule
#[must_use]
pub fn tessellate(polygon: &Polygon, fill_rule: FillRule) -> Traps {
    let traps = sweep(polygon.edges(), |winding| fill_rule.is_inside(winding[0]));
    log::trace!(
        "Tessellated {} edges into {} trapezoids",
        polygon.edges().len(),
        traps.len()
    );
    traps
}

/// Compute the area covered by both `polygon` (under the given fill rule) and `clip`
#[must_use]
pub fn tessellate_clipped(polygon: &Polygon, fill_rule: FillRule, clip: &Traps) -> Traps {
    let mut edges = polygon.clone().with_group(0);
    edges.append(&clip.to_polygon(1));
    sweep(edges.edges(), |winding| {
        fill_rule.is_inside(winding[0]) && winding[1] != 0
    })
}

/// Compute the area covered by both `a` and `b`
#[must_use]
pub fn intersect(a: &Traps, b: &Traps) -> Traps {
    if a.is_empty() || b.is_empty() {
        return Traps::default();
    }

    let mut edges = a.to_polygon(0);
    edges.append(&b.to_polygon(1));
    sweep(edges.edges(), |winding| winding[0] != 0 && winding[1] != 0)
}

#[derive(Clone, Copy, Debug)]
struct ActiveEdge {
    edge: Edge,

    /// Position in the input, used to break ties
    index: usize,

    x_top: Fixed,
    x_bottom: Fixed,
}

/// A trapezoid that might be extended by the next band
#[derive(Clone, Copy, Debug)]
struct OpenSpan {
    left: Line,
    right: Line,
    winding: i32,
    trap: usize,
}

fn sweep<F>(edges: &[Edge], is_inside: F) -> Traps
where
    F: Fn([i32; 2]) -> bool,
{
    // Sort edges by their top y coordinate, then their x coordinate, then by their
    // position in the input
    let mut pending: Vec<(usize, Edge)> = edges.iter().copied().enumerate().collect();
    pending.sort_by_key(|(index, edge)| (edge.top, edge.line.x_at(edge.top), *index));
    let mut pending = pending.into_iter().peekable();

    let mut traps: Vec<Trapezoid> = vec![];
    let mut active: Vec<ActiveEdge> = vec![];
    let mut open_spans: Vec<OpenSpan> = vec![];

    let Some((_, first)) = pending.peek() else {
        return Traps::default();
    };
    let mut y = first.top;

    loop {
        active.retain(|active_edge| active_edge.edge.bottom > y);
        while let Some((index, edge)) = pending.next_if(|(_, edge)| edge.top <= y) {
            active.push(ActiveEdge {
                edge,
                index,
                x_top: Fixed::ZERO,
                x_bottom: Fixed::ZERO,
            });
        }

        if active.is_empty() {
            open_spans.clear();
            match pending.peek() {
                Some((_, edge)) => {
                    y = edge.top;
                    continue;
                },
                None => break,
            }
        }

        // The band ends at the next event
        let mut next_y = active
            .iter()
            .map(|active_edge| active_edge.edge.bottom)
            .min()
            .unwrap_or(Fixed::MAX);
        if let Some((_, edge)) = pending.peek() {
            next_y = next_y.min(edge.top);
        }

        update_positions(&mut active, y, next_y);
        active.sort_by_key(|active_edge| {
            (active_edge.x_top, active_edge.x_bottom, active_edge.index)
        });

        // ...or where two neighbours swap places
        let mut crossing_found = false;
        for pair in active.windows(2) {
            if pair[0].x_bottom > pair[1].x_bottom {
                if let Some(crossing) = intersection_y(&pair[0].edge.line, &pair[1].edge.line) {
                    // Always make progress, even if rounding puts the crossing above the band
                    let crossing = crossing.max(y + Fixed::EPSILON);
                    if crossing < next_y {
                        next_y = crossing;
                        crossing_found = true;
                    }
                }
            }
        }
        if crossing_found {
            update_positions(&mut active, y, next_y);
        }

        open_spans = emit_band(&active, y, next_y, &is_inside, &open_spans, &mut traps);
        y = next_y;
    }

    Traps::from_trapezoids(traps)
}

fn update_positions(active: &mut [ActiveEdge], top: Fixed, bottom: Fixed) {
    for active_edge in active {
        active_edge.x_top = active_edge.edge.line.x_at(top);
        active_edge.x_bottom = active_edge.edge.line.x_at(bottom);
    }
}

/// Emit trapezoids for all spans inside the shape between `top` and `bottom`
fn emit_band<F>(
    active: &[ActiveEdge],
    top: Fixed,
    bottom: Fixed,
    is_inside: &F,
    open_spans: &[OpenSpan],
    traps: &mut Vec<Trapezoid>,
) -> Vec<OpenSpan>
where
    F: Fn([i32; 2]) -> bool,
{
    let mut next_open_spans = vec![];
    let mut winding = [0; 2];
    let mut span_start: Option<(&ActiveEdge, i32)> = None;

    for active_edge in active {
        let was_inside = is_inside(winding);
        winding[active_edge.edge.group.min(1)] += active_edge.edge.direction;
        let is_now_inside = is_inside(winding);

        if !was_inside && is_now_inside {
            span_start = Some((active_edge, winding[0]));
            continue;
        }

        if !(was_inside && !is_now_inside) {
            continue;
        }

        let Some((left, span_winding)) = span_start.take() else {
            continue;
        };
        let right = active_edge;

        // Coincident edges enclose nothing
        if left.x_top == right.x_top && left.x_bottom == right.x_bottom {
            continue;
        }

        // Collinear edges (a vertex in the middle of a straight side) do not
        // need to start a new trapezoid
        let continued_span = open_spans.iter().find(|span| {
            span.winding == span_winding
                && span.left.is_collinear_with(&left.edge.line)
                && span.right.is_collinear_with(&right.edge.line)
        });

        let trap = match continued_span {
            Some(span) if traps[span.trap].bottom == top => {
                traps[span.trap].bottom = bottom;
                span.trap
            },
            _ => {
                traps.push(Trapezoid {
                    top,
                    bottom,
                    left: left.edge.line,
                    right: right.edge.line,
                    winding: span_winding,
                });
                traps.len() - 1
            },
        };

        next_open_spans.push(OpenSpan {
            left: traps[trap].left,
            right: traps[trap].right,
            winding: span_winding,
            trap,
        });
    }

    next_open_spans
}

/// The height at which two lines intersect, rounded down to the fixed point grid
///
/// Returns `None` for parallel lines.
fn intersection_y(a: &Line, b: &Line) -> Option<Fixed> {
    let bits = |value: Fixed| i128::from(value.bits());

    let (ax, ay) = (bits(a.p1.x), bits(a.p1.y));
    let (bx, by) = (bits(b.p1.x), bits(b.p1.y));
    let (adx, ady) = (bits(a.p2.x) - ax, bits(a.p2.y) - ay);
    let (bdx, bdy) = (bits(b.p2.x) - bx, bits(b.p2.y) - by);

    let denominator = adx * bdy - bdx * ady;
    if denominator == 0 {
        return None;
    }

    let numerator = (bx - ax) * ady * bdy - by * bdx * ady + ay * adx * bdy;
    let (numerator, denominator) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };

    let y = numerator.div_euclid(denominator);
    let y = y.clamp(i128::from(Fixed::MIN.bits()), i128::from(Fixed::MAX.bits()));
    Some(Fixed::from_bits(y as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::point_from_f64;

    fn polygon(outlines: &[&[(f64, f64)]]) -> Polygon {
        let mut polygon = Polygon::new();
        for outline in outlines {
            let points: Vec<Vec2D> = outline.iter().map(|&(x, y)| Vec2D::new(x, y)).collect();
            polygon.add_polyline(&points);
        }
        polygon
    }

    fn area(traps: &Traps) -> f64 {
        traps
            .traps()
            .iter()
            .map(|trap| {
                let top = trap.top.to_f64();
                let bottom = trap.bottom.to_f64();
                let width_top = trap.right.x_at_f64(top) - trap.left.x_at_f64(top);
                let width_bottom = trap.right.x_at_f64(bottom) - trap.left.x_at_f64(bottom);
                0.5 * (width_top + width_bottom) * (bottom - top)
            })
            .sum()
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rectangle<Fixed> {
        Rectangle::from_corners(
            point_from_f64(Vec2D::new(x0, y0)),
            point_from_f64(Vec2D::new(x1, y1)),
        )
    }

    const SQUARE: &[(f64, f64)] = &[(0., 0.), (10., 0.), (10., 10.), (0., 10.)];
    const SQUARE_REVERSED: &[(f64, f64)] = &[(0., 0.), (0., 10.), (10., 10.), (10., 0.)];

    #[test]
    fn trapezoids_are_totally_comparable() {
        fn require_eq<T: Eq>(value: T) -> T {
            value
        }

        let traps = tessellate(
            &polygon(&[&[(0., 0.), (4., 0.), (4., 4.), (0., 4.)]]),
            FillRule::Winding,
        );
        assert_eq!(traps.len(), 1);

        let trapezoid = require_eq(traps.traps()[0]);
        assert_eq!(trapezoid, traps.traps()[0]);
        assert_eq!(require_eq(trapezoid.left).x_at(trapezoid.top), Fixed::ZERO);
    }

    #[test]
    fn single_square() {
        let traps = tessellate(&polygon(&[SQUARE]), FillRule::Winding);
        assert_eq!(traps.len(), 1);
        assert_eq!(area(&traps), 100.);
        assert_eq!(traps.extents(), Some(rect(0., 0., 10., 10.)));
        assert_eq!(traps.traps()[0].winding.abs(), 1);
    }

    #[test]
    fn cancelling_outlines_are_empty() {
        // Traced twice in one direction and once in the other leaves winding 1
        // under the nonzero rule, so use two opposite outlines for full cancellation
        let cancelling = polygon(&[SQUARE, SQUARE_REVERSED]);
        for rule in [FillRule::Winding, FillRule::EvenOdd] {
            let traps = tessellate(&cancelling, rule);
            assert!(traps.is_empty());
            assert_eq!(traps.extents(), None);
        }

        // Twice in the same direction cancels under even-odd only
        let doubled = polygon(&[SQUARE, SQUARE]);
        assert!(tessellate(&doubled, FillRule::EvenOdd).is_empty());
        assert_eq!(area(&tessellate(&doubled, FillRule::Winding)), 100.);
    }

    #[test]
    fn fill_rules_differ_for_nested_outlines() {
        let inner: &[(f64, f64)] = &[(2., 2.), (8., 2.), (8., 8.), (2., 8.)];
        let nested = polygon(&[SQUARE, inner]);

        assert_eq!(area(&tessellate(&nested, FillRule::Winding)), 100.);
        assert_eq!(area(&tessellate(&nested, FillRule::EvenOdd)), 64.);
    }

    #[test]
    fn degenerate_outlines_produce_nothing() {
        // move_to, line_to and back again
        let spike = polygon(&[&[(5., 0.), (5., 10.)], &[(0., 0.), (3., 7.), (0., 0.)]]);
        for rule in [FillRule::Winding, FillRule::EvenOdd] {
            let traps = tessellate(&spike, rule);
            assert!(traps.is_empty());
            assert!(!traps.contains_point(Vec2D::new(5., 5.)));
        }
    }

    #[test]
    fn self_intersecting_bowtie() {
        let bowtie = polygon(&[&[(0., 0.), (10., 10.), (10., 0.), (0., 10.)]]);
        let traps = tessellate(&bowtie, FillRule::Winding);

        // Two triangles, 25 units each
        assert!((area(&traps) - 50.).abs() < 0.1, "area is {}", area(&traps));
        assert!(traps.contains_point(Vec2D::new(2., 5.)));
        assert!(traps.contains_point(Vec2D::new(8., 5.)));
        assert!(!traps.contains_point(Vec2D::new(5., 2.)));
        assert!(!traps.contains_point(Vec2D::new(5., 8.)));
    }

    #[test]
    fn trapezoids_are_sorted_and_disjoint() {
        let star = polygon(&[&[(50., 0.), (79., 90.), (2., 35.), (98., 35.), (21., 90.)]]);
        let traps = tessellate(&star, FillRule::EvenOdd);

        assert!(traps.traps().windows(2).all(|pair| pair[0].top <= pair[1].top));
        for y in 0..90 {
            for x in 0..100 {
                let point = Vec2D::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let hits = traps
                    .traps()
                    .iter()
                    .filter(|trap| trap.contains_point(point))
                    .count();
                assert!(hits <= 1);
            }
        }

        // The center pentagon has winding 2
        assert!(!traps.contains_point(Vec2D::new(50., 45.)));
        assert!(tessellate(&star, FillRule::Winding).contains_point(Vec2D::new(50., 45.)));
    }

    #[test]
    fn vertically_adjacent_bands_are_merged() {
        // The vertex at y=5 splits the sweep into two bands, but the
        // span between the two outer edges continues
        let shape = polygon(&[&[(0., 0.), (10., 0.), (10., 10.), (0., 10.), (0., 5.)]]);
        let traps = tessellate(&shape, FillRule::Winding);
        assert_eq!(traps.len(), 1);
    }

    #[test]
    fn intersection_of_rectangles() {
        let a = Traps::from_rectangle(rect(0., 0., 10., 10.));
        let b = Traps::from_rectangle(rect(5., -5., 20., 7.));
        let result = intersect(&a, &b);
        assert_eq!(area(&result), 35.);
        assert_eq!(result.extents(), Some(rect(5., 0., 10., 7.)));

        let disjoint = Traps::from_rectangle(rect(20., 20., 30., 30.));
        assert!(intersect(&a, &disjoint).is_empty());
    }

    #[test]
    fn intersection_of_disjoint_diamonds() {
        // The bounding boxes overlap, the shapes do not
        let first = polygon(&[&[(10., 0.), (20., 10.), (10., 20.), (0., 10.)]]);
        let second = polygon(&[&[(26., 6.), (36., 16.), (26., 26.), (16., 16.)]]);

        let a = tessellate(&first, FillRule::Winding);
        let b = tessellate(&second, FillRule::Winding);
        let result = intersect(&a, &b);
        assert!(result.is_empty());

        let clipped = tessellate_clipped(&second, FillRule::Winding, &a);
        assert!(clipped.is_empty());
    }

    #[test]
    fn clipped_tessellation() {
        let clip = Traps::from_rectangle(rect(0., 0., 5., 5.));
        let traps = tessellate_clipped(&polygon(&[SQUARE]), FillRule::Winding, &clip);
        assert_eq!(area(&traps), 25.);
    }

    #[test]
    fn huge_rectangles_saturate() {
        let huge = polygon(&[&[(-1e20, -1e20), (1e20, -1e20), (1e20, 1e20), (-1e20, 1e20)]]);
        let traps = tessellate(&huge, FillRule::Winding);
        assert_eq!(traps.len(), 1);
        assert!(traps.contains_point(Vec2D::new(0., 0.)));

        let clipped = intersect(&traps, &Traps::from_rectangle(rect(0., 0., 4., 4.)));
        assert_eq!(area(&clipped), 16.);
    }

    #[test]
    fn crossing_height() {
        let a = Line {
            p1: point_from_f64(Vec2D::new(0., 0.)),
            p2: point_from_f64(Vec2D::new(10., 10.)),
        };
        let b = Line {
            p1: point_from_f64(Vec2D::new(10., 0.)),
            p2: point_from_f64(Vec2D::new(0., 10.)),
        };
        assert_eq!(intersection_y(&a, &b), Some(Fixed::from_f64(5.)));
        assert_eq!(intersection_y(&a, &a), None);
    }
}
