//! Combines coverage, clip and source into the destination pixels

use math::{Rectangle, Vec2D};

use crate::{
    clip::ClipRegion,
    pattern::PreparedPattern,
    polygon::Fixed,
    rasterizer::Mask,
    surface::SurfaceData,
    tessellator::Traps,
    Antialias, Operator,
};

/// The shape being drawn
#[derive(Clone, Copy, Debug)]
pub(crate) enum Coverage<'a> {
    /// The whole destination
    Everything,

    /// The area covered by the trapezoids
    Traps(&'a Traps),

    /// The alpha channel of a pattern
    Alpha(&'a PreparedPattern),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Composite<'a> {
    pub operator: Operator,
    pub source: &'a PreparedPattern,
    pub coverage: Coverage<'a>,
    pub clip: &'a ClipRegion,
    pub antialias: Antialias,

    /// Extra factor applied to the coverage
    pub opacity: f32,
}

/// The smallest pixel-aligned rectangle containing `rectangle`
fn pixel_bounds(rectangle: Rectangle<Fixed>) -> Rectangle<i32> {
    let top_left = rectangle.top_left();
    let bottom_right = rectangle.bottom_right();
    Rectangle::from_corners(
        Vec2D::new(top_left.x.integer_floor(), top_left.y.integer_floor()),
        Vec2D::new(bottom_right.x.integer_ceil(), bottom_right.y.integer_ceil()),
    )
}

/// Draw to `target`.
///
/// Bounded operators only touch pixels covered by the shape. Unbounded ones
/// touch every pixel inside the clip, because they can clear the destination
/// where the shape is transparent.
pub(crate) fn composite(target: &mut SurfaceData, request: &Composite<'_>) {
    let (Ok(width), Ok(height)) = (
        i32::try_from(target.width()),
        i32::try_from(target.height()),
    ) else {
        return;
    };

    let destination = Rectangle::from_corners(Vec2D::new(0, 0), Vec2D::new(width, height));
    if destination.is_degenerate() {
        return;
    }

    let clip_bounds = match request.clip.traps() {
        None => Some(destination),
        Some(traps) => traps.extents().map(pixel_bounds),
    };
    let Some(clip_bounds) = clip_bounds else {
        log::trace!("Nothing to draw, the clip region is empty");
        return;
    };

    let region = if request.operator.is_unbounded() {
        clip_bounds.intersection(destination)
    } else {
        let shape_bounds = match request.coverage {
            Coverage::Traps(traps) => traps.extents().map(pixel_bounds),
            Coverage::Everything | Coverage::Alpha(_) => Some(destination),
        };

        shape_bounds
            .and_then(|bounds| bounds.intersection(clip_bounds))
            .and_then(|bounds| bounds.intersection(destination))
    };

    let Some(region) = region else {
        return;
    };

    let clip_mask = request
        .clip
        .traps()
        .map(|traps| Mask::from_traps(traps, region, request.antialias));
    let shape_mask = match request.coverage {
        Coverage::Traps(traps) => Some(Mask::from_traps(traps, region, request.antialias)),
        _ => None,
    };

    let is_bounded = !request.operator.is_unbounded();
    let mut pixels = target.pixels_mut();

    let top_left = region.top_left();
    let bottom_right = region.bottom_right();
    for y in top_left.y..bottom_right.y {
        for x in top_left.x..bottom_right.x {
            let clip = clip_mask
                .as_ref()
                .map_or(1., |mask| mask.coverage_at(x, y));
            if clip == 0. {
                continue;
            }

            let coverage = match request.coverage {
                Coverage::Everything => 1.,
                Coverage::Traps(_) => shape_mask
                    .as_ref()
                    .map_or(0., |mask| mask.coverage_at(x, y)),
                Coverage::Alpha(pattern) => pattern.color_at(x, y)[3],
            } * request.opacity;

            if coverage == 0. && is_bounded {
                continue;
            }

            // The region lies within the destination, so both are non-negative
            let (column, row) = (x as usize, y as usize);

            let source = request.source.color_at(x, y);
            let destination = pixels.get(column, row);
            let result = request
                .operator
                .composite(source, destination, coverage, clip);
            pixels.set(column, row, result);
        }
    }
}
