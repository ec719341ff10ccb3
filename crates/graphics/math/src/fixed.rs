//! Fixed-point arithmetic

use std::{fmt, ops};

/// Fixed point number using two's complement
///
/// `N` defines the number of fractional bits. The number of
/// integer bits is equal to `32 - N`.
///
/// Conversions from floating point saturate instead of wrapping around, so
/// coordinates far outside of any surface still compare correctly.
///
/// # Examples
///
/// Basic Usage:
/// ```
/// # use math::Fixed;
/// let a = Fixed::<5>::from(1.5);
/// let b = Fixed::<5>::from(3.25);
///
/// assert_eq!(a + b, Fixed::<5>::from(4.75));
/// ```
#[derive(Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct Fixed<const N: usize>(i32);

/// The coordinate type used by the rasterizer, 1/256th of a pixel precision
pub type Fixed24Dot8 = Fixed<8>;

impl<const N: usize> Fixed<N> {
    pub const INT_BITS: usize = 32 - N;
    pub const FRAC_BITS: usize = N;

    // Option::unwrap_or(0) is not const :/
    const SCALING_FACTOR: usize = match 1_usize.checked_shl(Self::FRAC_BITS as u32) {
        Some(v) => v,
        None => 0,
    };

    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << N);

    /// Largest representable value.
    ///
    /// One bit of headroom is kept so that the difference of two
    /// coordinates never overflows.
    pub const MAX: Self = Self(i32::MAX >> 1);

    /// Smallest representable value, see [Fixed::MAX]
    pub const MIN: Self = Self(-(i32::MAX >> 1));

    /// The smallest positive value
    pub const EPSILON: Self = Self(1);

    /// Computes the absolute value of `self`.
    ///
    /// # Examples
    ///
    /// Basic Usage:
    /// ```
    /// # use math::Fixed;
    /// assert_eq!(Fixed::<3>::from(42.).abs(), Fixed::<3>::from(42.));
    /// assert_eq!(Fixed::<3>::from(-42.).abs(), Fixed::<3>::from(42.));
    /// ```
    #[inline]
    #[must_use]
    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    #[must_use]
    pub const fn bits(&self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn from_int(value: i32) -> Self {
        Self(value << N)
    }

    /// Returns the largest integer less than or equal to `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use math::Fixed;
    /// let f = Fixed::<5>::from(3.0);
    /// let g = Fixed::<5>::from(3.875);
    ///
    /// assert_eq!(f.floor(), Fixed::<5>::from(3.0));
    /// assert_eq!(g.floor(), Fixed::<5>::from(3.0));
    /// ```
    #[must_use]
    #[inline]
    pub const fn floor(&self) -> Self {
        let mask = (1 << Self::FRAC_BITS) - 1;
        Self(self.0 & !mask)
    }

    /// The integer part of `self`, rounded towards negative infinity
    #[must_use]
    #[inline]
    pub const fn integer_floor(&self) -> i32 {
        self.0 >> N
    }

    /// The integer part of `self`, rounded towards positive infinity
    #[must_use]
    #[inline]
    pub const fn integer_ceil(&self) -> i32 {
        (self.0 + ((1 << N) - 1)) >> N
    }

    #[must_use]
    #[inline]
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / Self::SCALING_FACTOR as f64
    }

    /// Convert from a double, rounding to the nearest representable value.
    ///
    /// Values outside of `MIN..=MAX` saturate, `NaN` maps to zero.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        let scaled = (value * Self::SCALING_FACTOR as f64).round();
        if scaled.is_nan() {
            return Self::ZERO;
        }
        let clamped = scaled.clamp(f64::from(Self::MIN.0), f64::from(Self::MAX.0));
        Self(clamped as i32)
    }
}

impl<const N: usize> From<f64> for Fixed<N> {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl<const N: usize> From<Fixed<N>> for f64 {
    fn from(value: Fixed<N>) -> Self {
        value.to_f64()
    }
}

impl<const N: usize> fmt::Debug for Fixed<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_f64())?;
        Ok(())
    }
}

impl<const N: usize> fmt::Display for Fixed<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl<const N: usize> ops::Add for Fixed<N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl<const N: usize> ops::AddAssign for Fixed<N> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const N: usize> ops::Sub for Fixed<N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl<const N: usize> ops::SubAssign for Fixed<N> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<const N: usize> ops::Neg for Fixed<N> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.saturating_neg())
    }
}

impl<const N: usize> PartialOrd for Fixed<N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: usize> Ord for Fixed<N> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}
