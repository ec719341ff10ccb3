//! The area drawing operations are restricted to

use std::rc::Rc;

use math::{Rectangle, Vec2D};

use crate::{
    polygon::Polygon,
    tessellator::{tessellate, tessellate_clipped, FillRule, Traps},
    Error, Result,
};

/// Either everything, or the area covered by a set of trapezoids (in device space).
///
/// Regions are immutable and cheap to clone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipRegion(Option<Rc<Traps>>);

impl ClipRegion {
    /// A region that does not restrict drawing at all
    #[must_use]
    pub fn unbounded() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn from_traps(traps: Traps) -> Self {
        Self(Some(Rc::new(traps)))
    }

    #[inline]
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.0.is_none()
    }

    /// The trapezoids making up the region, `None` if it is unbounded
    #[inline]
    #[must_use]
    pub fn traps(&self) -> Option<&Traps> {
        self.0.as_deref()
    }

    /// Return `true` if nothing can be drawn inside the region
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traps().is_some_and(Traps::is_empty)
    }

    /// Restrict the region to the area covered by `polygon`
    #[must_use]
    pub fn intersect_polygon(&self, polygon: &Polygon, fill_rule: FillRule) -> Self {
        let traps = match self.traps() {
            None => tessellate(polygon, fill_rule),
            Some(current) if current.is_empty() => return self.clone(),
            Some(current) => tessellate_clipped(polygon, fill_rule, current),
        };

        log::debug!("Clip region reduced to {} trapezoids", traps.len());
        Self::from_traps(traps)
    }

    /// The bounding box of a bounded region, `None` if the region is unbounded or empty
    #[must_use]
    pub fn extents(&self) -> Option<Rectangle> {
        self.traps().and_then(Traps::extents_f64)
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec2D) -> bool {
        self.traps().map_or(true, |traps| traps.contains_point(point))
    }
}

/// The current clip region, together with the regions saved by `save()`
#[derive(Clone, Debug, Default)]
pub struct ClipStack {
    current: ClipRegion,
    saved: Vec<ClipRegion>,
}

impl ClipStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> &ClipRegion {
        &self.current
    }

    /// Intersect the current region with the area covered by `polygon`
    pub fn push(&mut self, polygon: &Polygon, fill_rule: FillRule) {
        self.current = self.current.intersect_polygon(polygon, fill_rule);
    }

    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Return to the region at the matching call to [ClipStack::save]
    pub fn restore(&mut self) -> Result<()> {
        self.current = self.saved.pop().ok_or(Error::InvalidRestore)?;
        Ok(())
    }

    /// Remove all clipping, without affecting saved regions
    pub fn reset(&mut self) {
        self.current = ClipRegion::unbounded();
    }

    #[inline]
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.current.is_unbounded()
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}
