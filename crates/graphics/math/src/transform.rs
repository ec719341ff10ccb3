use super::{Angle, Vec2D};

/// A 2-dimensional transformation.
///
/// Each [AffineTransform] is a `3x3` matrix that transforms a 2 dimensional vector `x`, `y`.
/// See [Wikipedia](https://en.wikipedia.org/wiki/Affine_transformation) for more information.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform([[f64; 3]; 2]);

impl AffineTransform {
    #[inline]
    #[must_use]
    pub const fn identity() -> Self {
        Self([[1., 0., 0.], [0., 1., 0.]])
    }

    /// Create a transform from its six coefficients.
    ///
    /// `x' = xx * x + xy * y + x0` and `y' = yx * x + yy * y + y0`
    #[inline]
    #[must_use]
    pub const fn new(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Self {
        Self([[xx, xy, x0], [yx, yy, y0]])
    }

    /// Create transformation that shifts every point by a fixed offset
    #[inline]
    #[must_use]
    pub const fn translate(translate_by: Vec2D) -> Self {
        Self([[1., 0., translate_by.x], [0., 1., translate_by.y]])
    }

    /// Create a transformation that scales points by fixed values along the X and Y axis
    #[inline]
    #[must_use]
    pub const fn scale(x_scale: f64, y_scale: f64) -> Self {
        Self([[x_scale, 0., 0.], [0., y_scale, 0.]])
    }

    /// Create a transformation that rotates points around the origin by a fixed
    /// amount. Positive angles rotate from the positive x axis towards the positive y axis.
    #[inline]
    #[must_use]
    pub fn rotate(angle: Angle) -> Self {
        Self([
            [angle.cos(), -angle.sin(), 0.],
            [angle.sin(), angle.cos(), 0.],
        ])
    }

    /// Apply this transform to a provided vector
    #[inline]
    #[must_use]
    pub fn apply_to(self, point: Vec2D) -> Vec2D {
        Vec2D {
            x: point
                .x
                .mul_add(self.0[0][0], point.y.mul_add(self.0[0][1], self.0[0][2])),
            y: point
                .x
                .mul_add(self.0[1][0], point.y.mul_add(self.0[1][1], self.0[1][2])),
        }
    }

    /// Apply this transform to a distance vector, ignoring the translation part
    #[inline]
    #[must_use]
    pub fn apply_to_distance(self, distance: Vec2D) -> Vec2D {
        Vec2D {
            x: distance.x.mul_add(self.0[0][0], distance.y * self.0[0][1]),
            y: distance.x.mul_add(self.0[1][0], distance.y * self.0[1][1]),
        }
    }

    /// Combine two transforms together into a single one
    ///
    /// The resulting transform applies `self` first and `other` second.
    #[inline]
    #[must_use]
    pub fn chain(&self, other: Self) -> Self {
        // Multiply the two matrices together
        // a b c
        // d e f
        // 0 0 1
        let a = other.0[0][0].mul_add(self.0[0][0], other.0[0][1] * self.0[1][0]);
        let b = other.0[0][0].mul_add(self.0[0][1], other.0[0][1] * self.0[1][1]);
        let c = other.0[0][0].mul_add(
            self.0[0][2],
            other.0[0][1].mul_add(self.0[1][2], other.0[0][2]),
        );

        let d = other.0[1][0].mul_add(self.0[0][0], other.0[1][1] * self.0[1][0]);
        let e = other.0[1][0].mul_add(self.0[0][1], other.0[1][1] * self.0[1][1]);
        let f = other.0[1][0].mul_add(
            self.0[0][2],
            other.0[1][1].mul_add(self.0[1][2], other.0[1][2]),
        );

        Self([[a, b, c], [d, e, f]])
    }

    #[inline]
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.0[0][0] * self.0[1][1] - self.0[0][1] * self.0[1][0]
    }

    /// Compute the inverse transform.
    ///
    /// Returns `None` if the transform collapses the plane (or contains non-finite values).
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0. || !det.is_finite() {
            return None;
        }

        let [[a, b, c], [d, e, f]] = self.0;
        let inverse = Self([
            [e / det, -b / det, (b * f - e * c) / det],
            [-d / det, a / det, (d * c - a * f) / det],
        ]);

        inverse
            .0
            .iter()
            .flatten()
            .all(|value| value.is_finite())
            .then_some(inverse)
    }

    #[inline]
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        self.inverse().is_some()
    }

    /// The largest factor by which the transform stretches any distance.
    ///
    /// This is the largest singular value of the linear part.
    #[must_use]
    pub fn max_scale_factor(&self) -> f64 {
        let [[a, b, _], [c, d, _]] = self.0;
        let sum_of_squares = a * a + b * b + c * c + d * d;
        let det = self.determinant();
        let discriminant = (sum_of_squares * sum_of_squares - 4. * det * det).max(0.);
        (0.5 * (sum_of_squares + discriminant.sqrt())).sqrt()
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let transform = AffineTransform::identity();
        let point = Vec2D::new(2., 3.);
        assert_eq!(transform.apply_to(point), point);
    }

    #[test]
    fn test_translate() {
        let transform = AffineTransform::translate(Vec2D::new(1., 2.));
        let point = Vec2D::new(4., -3.);
        assert_eq!(transform.apply_to(point), Vec2D::new(5., -1.));
    }

    #[test]
    fn test_scale() {
        let transform = AffineTransform::scale(2., -1.);
        let point = Vec2D::new(2., 2.);
        assert_eq!(transform.apply_to(point), Vec2D::new(4., -2.));
    }

    #[test]
    fn test_chain() {
        let translate = AffineTransform::translate(Vec2D::new(1., 2.));
        let scale = AffineTransform::scale(2., 3.);
        let chained = translate.chain(scale);
        let p = Vec2D::new(-2., 2.);
        assert_eq!(chained.apply_to(p), Vec2D::new(-2., 12.));
    }

    #[test]
    fn test_inverse() {
        let transform = AffineTransform::translate(Vec2D::new(3., -4.))
            .chain(AffineTransform::scale(2., 4.));
        let inverse = transform.inverse().expect("transform is invertible");
        let p = Vec2D::new(1.5, -2.);
        assert_eq!(inverse.apply_to(transform.apply_to(p)), p);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(AffineTransform::scale(0., 1.).inverse().is_none());
        assert!(AffineTransform::new(1., 2., 2., 4., 0., 0.).inverse().is_none());
    }

    #[test]
    fn distance_ignores_translation() {
        let transform = AffineTransform::translate(Vec2D::new(10., 10.))
            .chain(AffineTransform::scale(2., 2.));
        assert_eq!(
            transform.apply_to_distance(Vec2D::new(1., 1.)),
            Vec2D::new(2., 2.)
        );
    }

    #[test]
    fn scale_factor() {
        assert_eq!(AffineTransform::scale(3., 1.).max_scale_factor(), 3.);
        assert_eq!(AffineTransform::identity().max_scale_factor(), 1.);
    }
}
