use std::f64::consts::{PI, TAU};

/// Zero cost wrapper type for an `f64`.
///
/// This type exists since coordinates are also `f64`'s.
/// It should enforce type safety to prevent coordinates from accidentally being
/// used as angles.
#[derive(Clone, Copy, Debug, Default)]
pub struct Angle(f64);

impl Angle {
    /// Angles with a difference below this value (in radians) are considered equal
    const MAX_ERROR: f64 = 0.01;

    #[inline]
    #[must_use]
    pub const fn from_radians(radians: f64) -> Self {
        Self(radians)
    }

    #[inline]
    #[must_use]
    pub const fn radians(&self) -> f64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn diff(&self, other: &Self) -> Self {
        let mut difference_in_radians = (self.0 - other.0).abs() % TAU;

        if PI < difference_in_radians {
            difference_in_radians = TAU - difference_in_radians;
        }

        Self(difference_in_radians)
    }

    #[inline]
    #[must_use]
    pub fn sin(&self) -> f64 {
        self.0.sin()
    }

    #[inline]
    #[must_use]
    pub fn cos(&self) -> f64 {
        self.0.cos()
    }

    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl PartialEq for Angle {
    fn eq(&self, other: &Self) -> bool {
        self.diff(other).0 < Self::MAX_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_wraps_around() {
        assert_eq!(Angle::from_radians(0.), Angle::from_radians(TAU));
        assert_eq!(Angle::from_radians(-PI), Angle::from_radians(PI));
        assert_ne!(Angle::from_radians(0.), Angle::from_radians(PI));
    }

    #[test]
    fn diff_is_shortest_distance() {
        let a = Angle::from_radians(0.1);
        let b = Angle::from_radians(TAU - 0.1);
        assert!((a.diff(&b).radians() - 0.2).abs() < 1e-9);
    }
}
