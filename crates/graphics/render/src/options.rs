//! Rendering defaults

use crate::{FillRule, LineCap, LineJoin};

/// How edges of shapes are smoothed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Antialias {
    /// Use the default antialiasing for the target (area coverage)
    #[default]
    Default,

    /// Binary coverage, a pixel is either fully inside or fully outside
    None,

    /// Grayscale area coverage
    Gray,

    Fast,
    Good,
    Best,
}

impl Antialias {
    /// Whether or not partially covered pixels are blended
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// The state a fresh [Context](crate::Context) starts out with
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    /// Maximum distance (in device pixels) between a curve and its polygonal approximation
    pub tolerance: f64,
    pub antialias: Antialias,
    pub fill_rule: FillRule,
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tolerance: 0.1,
            antialias: Antialias::default(),
            fill_rule: FillRule::default(),
            line_width: 2.,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 10.,
        }
    }
}
