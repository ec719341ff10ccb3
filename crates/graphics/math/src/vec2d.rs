use std::ops::{Add, Div, Mul, Neg, Sub};

/// Generate a trait impl for an operation involving two [Vec2D]s, like [Add] or [Sub]
macro_rules! impl_bin_op {
    ($trait: ident, $fn: ident, $op: tt) => {
        impl<T: $trait<T, Output = T>> $trait for Vec2D<T> {
            type Output = Vec2D<T>;

            fn $fn(self, rhs: Self) -> Self::Output {
                Self {
                    x: self.x $op rhs.x,
                    y: self.y $op rhs.y,
                }
            }
        }
    };
}

/// Generate a trait impl for an operation involving a [Vec2D] and a scalar value of unknown type
macro_rules! impl_scalar_op {
    ($trait: ident, $fn: ident, $op: tt, $rhs: ident) => {
        impl<T: $trait<$rhs, Output = T>> $trait<$rhs> for Vec2D<T> {
            type Output = Vec2D<T>;

            fn $fn(self, rhs: $rhs) -> Self::Output {
                Self {
                    x: self.x $op rhs,
                    y: self.y $op rhs,
                }
            }
        }
    };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Vec2D<T = f64> {
    pub x: T,
    pub y: T,
}

impl<T> Vec2D<T> {
    #[inline]
    #[must_use]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    #[inline]
    #[must_use]
    pub fn map<U, F: Fn(T) -> U>(self, f: F) -> Vec2D<U> {
        Vec2D {
            x: f(self.x),
            y: f(self.y),
        }
    }
}

impl Vec2D<f64> {
    #[inline]
    #[must_use]
    pub fn middle(a: Self, b: Self) -> Self {
        Self::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
    }

    #[inline]
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    #[must_use]
    pub fn lerp(&self, other: Self, t: f64) -> Self {
        Self {
            x: (other.x - self.x).mul_add(t, self.x),
            y: (other.y - self.y).mul_add(t, self.y),
        }
    }

    // Compute the dot product of two vectors
    #[inline]
    #[must_use]
    pub fn dot(&self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    // Compute the cross product of two vectors
    #[inline]
    #[must_use]
    pub fn cross_product(&self, other: Self) -> f64 {
        self.x.mul_add(other.y, -self.y * other.x)
    }

    /// The vector rotated by a quarter turn, `(-y, x)`
    #[inline]
    #[must_use]
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Scale the vector to unit length.
    ///
    /// Returns `None` for vectors that are (almost) zero or not finite.
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let magnitude = self.magnitude();
        if magnitude < f64::EPSILON || !magnitude.is_finite() {
            return None;
        }
        Some(*self / magnitude)
    }

    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: Self) -> f64 {
        (other - *self).magnitude()
    }
}

impl<T: Neg<Output = T>> Neg for Vec2D<T> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl_bin_op!(Add, add, +);
impl_bin_op!(Sub, sub, -);

impl_scalar_op!(Mul, mul, *, f32);
impl_scalar_op!(Mul, mul, *, f64);
impl_scalar_op!(Mul, mul, *, i32);
impl_scalar_op!(Mul, mul, *, i64);
impl_scalar_op!(Mul, mul, *, usize);

impl_scalar_op!(Div, div, /, f32);
impl_scalar_op!(Div, div, /, f64);
impl_scalar_op!(Div, div, /, i32);
impl_scalar_op!(Div, div, /, i64);
impl_scalar_op!(Div, div, /, usize);

#[cfg(test)]
mod tests {
    use super::Vec2D;

    #[test]
    fn magnitude() {
        let vec = Vec2D::new(1., 1.);
        assert_eq!(vec.magnitude(), std::f64::consts::SQRT_2);
    }

    #[test]
    fn vec2d_add() {
        assert_eq!(Vec2D::new(1., 0.) + Vec2D::new(1., 1.), Vec2D::new(2., 1.));
        assert_eq!(Vec2D::new(-2, 1) + Vec2D::new(1, 0), Vec2D::new(-1, 1));
    }

    #[test]
    fn vec2d_sub() {
        assert_eq!(Vec2D::new(1., 0.) - Vec2D::new(1., 1.), Vec2D::new(0., -1.));
        assert_eq!(Vec2D::new(-2, 1) - Vec2D::new(1, 0), Vec2D::new(-3, 1));
    }

    #[test]
    fn vec2d_mul() {
        assert_eq!(Vec2D::new(1., -1.) * 2., Vec2D::new(2., -2.));
        assert_eq!(Vec2D::new(1, -1) * 2, Vec2D::new(2, -2));
    }

    #[test]
    fn normalize() {
        assert_eq!(Vec2D::new(3., 4.).normalized(), Some(Vec2D::new(0.6, 0.8)));
        assert_eq!(Vec2D::new(0., 0.).normalized(), None);
        assert_eq!(Vec2D::new(f64::NAN, 0.).normalized(), None);
    }

    #[test]
    fn cross_product_sign() {
        // Turning from +x towards +y is a positive rotation
        assert!(Vec2D::new(1., 0.).cross_product(Vec2D::new(0., 1.)) > 0.);
        assert!(Vec2D::new(0., 1.).cross_product(Vec2D::new(1., 0.)) < 0.);
    }
}
