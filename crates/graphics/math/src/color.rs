use std::fmt;

/// A color with straight (non-premultiplied) alpha.
///
/// All channels are in the range `0..=1`, constructors clamp their input.
#[derive(Clone, Copy, PartialEq)]
pub struct Color {
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64,
}

impl Color {
    pub const RED: Self = Self::opaque(1., 0., 0.);
    pub const GREEN: Self = Self::opaque(0., 1., 0.);
    pub const BLUE: Self = Self::opaque(0., 0., 1.);
    pub const WHITE: Self = Self::opaque(1., 1., 1.);
    pub const BLACK: Self = Self::opaque(0., 0., 0.);
    pub const MAGENTA: Self = Self::opaque(1., 0., 1.);
    pub const TRANSPARENT: Self = Self {
        red: 0.,
        green: 0.,
        blue: 0.,
        alpha: 0.,
    };

    /// Only used for the constants above, channels must already be in range
    const fn opaque(red: f64, green: f64, blue: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 1.,
        }
    }

    #[inline]
    #[must_use]
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.)
    }

    #[inline]
    #[must_use]
    pub fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red: clamp_channel(red),
            green: clamp_channel(green),
            blue: clamp_channel(blue),
            alpha: clamp_channel(alpha),
        }
    }

    #[inline]
    #[must_use]
    pub const fn red(&self) -> f64 {
        self.red
    }

    #[inline]
    #[must_use]
    pub const fn green(&self) -> f64 {
        self.green
    }

    #[inline]
    #[must_use]
    pub const fn blue(&self) -> f64 {
        self.blue
    }

    #[inline]
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    #[inline]
    #[must_use]
    pub fn with_alpha(&self, alpha: f64) -> Self {
        Self::rgba(self.red, self.green, self.blue, alpha)
    }

    /// Linearly interpolate between `self` (at `t = 0`) and `other` (at `t = 1`)
    #[must_use]
    pub fn interpolate(&self, other: Self, t: f64) -> Self {
        if t <= 0. {
            *self
        } else if t >= 1. {
            other
        } else {
            let lerp = |a: f64, b: f64| (b - a).mul_add(t, a);
            Self::rgba(
                lerp(self.red, other.red),
                lerp(self.green, other.green),
                lerp(self.blue, other.blue),
                lerp(self.alpha, other.alpha),
            )
        }
    }

    /// The premultiplied channels `[r * a, g * a, b * a, a]`
    #[inline]
    #[must_use]
    pub fn premultiplied(&self) -> [f32; 4] {
        let alpha = self.alpha as f32;
        [
            self.red as f32 * alpha,
            self.green as f32 * alpha,
            self.blue as f32 * alpha,
            alpha,
        ]
    }
}

fn clamp_channel(value: f64) -> f64 {
    // NaN must not leak into the color
    if value.is_nan() {
        0.
    } else {
        value.clamp(0., 1.)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({}, {}, {}, {})",
            self.red, self.green, self.blue, self.alpha
        )
    }
}
