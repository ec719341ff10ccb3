use super::Vec2D;

use std::{cmp, ops};

#[derive(Clone, Copy, Debug, Default)]
pub struct Rectangle<T = f64> {
    top_left: Vec2D<T>,
    bottom_right: Vec2D<T>,
}

impl<T> Rectangle<T> {
    pub const fn from_corners(top_left: Vec2D<T>, bottom_right: Vec2D<T>) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }
}

impl<T> Rectangle<T>
where
    T: Copy,
{
    pub const fn top_left(&self) -> Vec2D<T> {
        self.top_left
    }

    pub const fn top_right(&self) -> Vec2D<T> {
        Vec2D {
            x: self.bottom_right.x,
            y: self.top_left.y,
        }
    }

    pub const fn bottom_left(&self) -> Vec2D<T> {
        Vec2D {
            x: self.top_left.x,
            y: self.bottom_right.y,
        }
    }

    pub const fn bottom_right(&self) -> Vec2D<T> {
        self.bottom_right
    }
}

impl<T> Rectangle<T>
where
    T: ops::Add<Output = T> + ops::Sub<Output = T> + Copy,
{
    pub fn width(&self) -> T {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> T {
        self.bottom_right.y - self.top_left.y
    }
}

impl Rectangle<f64> {
    /// Smallest rectangle containing all of the points, `None` if there are none
    #[must_use]
    pub fn bounding_box<I: IntoIterator<Item = Vec2D>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self::from_corners(first, first);
        for point in points {
            bounds.top_left.x = bounds.top_left.x.min(point.x);
            bounds.top_left.y = bounds.top_left.y.min(point.y);
            bounds.bottom_right.x = bounds.bottom_right.x.max(point.x);
            bounds.bottom_right.y = bounds.bottom_right.y.max(point.y);
        }
        Some(bounds)
    }
}

impl<T> PartialEq for Rectangle<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.top_left == other.top_left && self.bottom_right == other.bottom_right
    }
}

impl<T> Rectangle<T>
where
    T: Ord + Copy,
{
    /// Return `true` if the rectangle has no area
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.bottom_right.x <= self.top_left.x || self.bottom_right.y <= self.top_left.y
    }

    /// Compute the overlap of two rectangles.
    ///
    /// Returns `None` if the rectangles do not share any area.
    #[must_use]
    pub fn intersection(&self, other: Self) -> Option<Self> {
        let intersection = Self {
            top_left: Vec2D::new(
                cmp::max(self.top_left.x, other.top_left.x),
                cmp::max(self.top_left.y, other.top_left.y),
            ),
            bottom_right: Vec2D::new(
                cmp::min(self.bottom_right.x, other.bottom_right.x),
                cmp::min(self.bottom_right.y, other.bottom_right.y),
            ),
        };

        (!intersection.is_degenerate()).then_some(intersection)
    }

    #[inline]
    pub fn grow_to_contain(&mut self, other: Self) {
        self.top_left.x = cmp::min(self.top_left.x, other.top_left.x);
        self.top_left.y = cmp::min(self.top_left.y, other.top_left.y);
        self.bottom_right.x = cmp::max(self.bottom_right.x, other.bottom_right.x);
        self.bottom_right.y = cmp::max(self.bottom_right.y, other.bottom_right.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping() {
        let a = Rectangle::from_corners(Vec2D::new(0, 0), Vec2D::new(10, 10));
        let b = Rectangle::from_corners(Vec2D::new(5, -5), Vec2D::new(20, 7));
        assert_eq!(
            a.intersection(b),
            Some(Rectangle::from_corners(Vec2D::new(5, 0), Vec2D::new(10, 7)))
        );
    }

    #[test]
    fn intersect_disjoint() {
        let a = Rectangle::from_corners(Vec2D::new(0, 0), Vec2D::new(10, 10));
        let b = Rectangle::from_corners(Vec2D::new(10, 0), Vec2D::new(20, 10));
        assert_eq!(a.intersection(b), None);
    }

    #[test]
    fn bounding_box_of_points() {
        let bounds = Rectangle::bounding_box([
            Vec2D::new(1., 5.),
            Vec2D::new(-2., 3.),
            Vec2D::new(4., -1.),
        ]);
        assert_eq!(
            bounds,
            Some(Rectangle::from_corners(
                Vec2D::new(-2., -1.),
                Vec2D::new(4., 5.)
            ))
        );
        assert_eq!(Rectangle::bounding_box(std::iter::empty()), None);
    }
}
