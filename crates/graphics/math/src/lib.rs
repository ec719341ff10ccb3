//! Common utilities used in graphics-related libraries

mod angle;
mod color;
mod fixed;
mod rect;
mod transform;
mod vec2d;

pub use angle::Angle;
pub use color::Color;
pub use fixed::{Fixed, Fixed24Dot8};
pub use rect::Rectangle;
pub use transform::AffineTransform;
pub use vec2d::Vec2D;
