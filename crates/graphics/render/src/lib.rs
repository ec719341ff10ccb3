//! A 2D vector graphics rasterizer.
//!
//! Paths are built and drawn through a [Context], which renders onto a [Surface].
//! Shapes are flattened into polygons, tessellated into [Trapezoids](Trapezoid),
//! rasterized into coverage masks and finally combined with the destination
//! using one of the [Operators](Operator).
//!
//! All coordinates passed to a [Context] are in user space, which is mapped to the
//! pixel grid of the target by the current transformation and the device transform
//! of the surface.

mod clip;
mod compositor;
mod context;
mod error;
mod flatten;
mod operator;
mod options;
mod path;
mod pattern;
mod polygon;
mod rasterizer;
mod stroker;
mod surface;
mod tessellator;

pub use clip::{ClipRegion, ClipStack};
pub use context::Context;
pub use error::{Error, Result};
pub use flatten::{Arc, ArcDirection, CubicBezier};
pub use operator::{Operator, Pixel};
pub use options::{Antialias, Options};
pub use path::{Path, Polyline, Segment, SubPath};
pub use pattern::{ColorStop, Extend, Filter, Gradient, MeshPatch, Pattern, PatternKind};
pub use polygon::Polygon;
pub use rasterizer::{Mask, Rasterizer};
pub use stroker::{stroke_to_polygon, LineCap, LineJoin, StrokeStyle};
pub use surface::{Format, Snapshot, Surface, MAX_SIZE};
pub use tessellator::{intersect, tessellate, tessellate_clipped, FillRule, Trapezoid, Traps};
