//! The drawing context, the main entry point of the crate

use math::{AffineTransform, Angle, Color, Rectangle, Vec2D};

use crate::{
    clip::ClipStack,
    compositor::{self, Composite, Coverage},
    error::Status,
    flatten::{Arc, ArcDirection},
    path::Path,
    pattern::Pattern,
    polygon::Polygon,
    stroker::{stroke_to_polygon, LineCap, LineJoin, StrokeStyle},
    surface::Surface,
    tessellator::{tessellate, FillRule, Traps},
    Antialias, Error, Operator, Options, Result,
};

/// Tolerances below the resolution of the fixed point grid have no effect
const MIN_TOLERANCE: f64 = 1. / 256.;

/// Graphics state, saved and restored as a whole
#[derive(Clone, Debug)]
struct GraphicsState {
    operator: Operator,
    source: Pattern,

    /// Maps device space to the user space that was in effect when the source was set
    source_inverse: AffineTransform,
    tolerance: f64,
    antialias: Antialias,
    fill_rule: FillRule,
    stroke_style: StrokeStyle,

    /// Maps user space to the surface's user space
    ctm: AffineTransform,
    ctm_inverse: AffineTransform,
}

/// An intermediate surface pushed by [Context::push_group]
#[derive(Debug)]
struct Group {
    /// The surface drawing returns to once the group is popped
    parent: Surface,

    /// Number of saved graphics states right after the group was pushed
    depth: usize,
}

/// Draws onto a [Surface].
///
/// Errors are sticky: once an operation fails, every following drawing
/// operation does nothing and [Context::status] keeps reporting the first error.
///
/// ```
/// # use render::{Context, Format, Surface};
/// let surface = Surface::new(Format::Argb32, 20, 20);
/// let mut context = Context::new(&surface);
///
/// context.set_source_rgb(1., 0., 0.);
/// context.rectangle(5., 5., 10., 10.);
/// context.fill();
///
/// assert!(context.status().is_ok());
/// assert_eq!(surface.pixel(10, 10), Some(0xFFFF_0000));
/// ```
#[derive(Debug)]
pub struct Context {
    target: Surface,
    gstate: GraphicsState,
    saved: Vec<GraphicsState>,
    groups: Vec<Group>,
    clip: ClipStack,

    /// In device space
    path: Path,
    status: Status,
}

impl Context {
    #[must_use]
    pub fn new(target: &Surface) -> Self {
        Self::with_options(target, Options::default())
    }

    #[must_use]
    pub fn with_options(target: &Surface, options: Options) -> Self {
        let mut stroke_style = StrokeStyle::default();
        stroke_style.line_width = options.line_width.max(0.);
        stroke_style.line_cap = options.line_cap;
        stroke_style.line_join = options.line_join;
        stroke_style.miter_limit = options.miter_limit;

        let mut status = Status::default();
        if let Err(error) = target.status() {
            status.set(error);
        }

        let device_inverse = target
            .device_transform()
            .inverse()
            .unwrap_or_else(AffineTransform::identity);

        Self {
            target: target.clone(),
            gstate: GraphicsState {
                operator: Operator::default(),
                source: Pattern::default(),
                source_inverse: device_inverse,
                tolerance: options.tolerance.max(MIN_TOLERANCE),
                antialias: options.antialias,
                fill_rule: options.fill_rule,
                stroke_style,
                ctm: AffineTransform::identity(),
                ctm_inverse: AffineTransform::identity(),
            },
            saved: vec![],
            groups: vec![],
            clip: ClipStack::new(),
            path: Path::new(),
            status,
        }
    }

    /// The first error that occurred while drawing, if any
    pub fn status(&self) -> Result<()> {
        self.status.get()
    }

    /// The surface the context was created for, even while a group is active
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Surface {
        self.groups.first().map_or(&self.target, |group| &group.parent)
    }

    /// The surface drawing operations currently go to
    #[inline]
    #[must_use]
    pub fn group_target(&self) -> &Surface {
        &self.target
    }

    /// Push a copy of the graphics state (including the clip) onto a stack
    pub fn save(&mut self) {
        if self.status.is_error() {
            return;
        }
        self.saved.push(self.gstate.clone());
        self.clip.save();
    }

    /// Return to the state at the last call to [Context::save]
    pub fn restore(&mut self) {
        if self.status.is_error() {
            return;
        }

        if self
            .groups
            .last()
            .is_some_and(|group| group.depth == self.saved.len())
        {
            // The state was saved by push_group
            self.status.set(Error::InvalidRestore);
            return;
        }

        match self.saved.pop() {
            Some(gstate) => {
                self.gstate = gstate;
                let result = self.clip.restore();
                self.status.check(result);
            },
            None => self.status.set(Error::InvalidRestore),
        }
    }

    /// Redirect drawing to a new transparent surface until the matching [Context::pop_group].
    ///
    /// The group has the size and device transform of the current target. Like
    /// [Context::save], this also saves the graphics state.
    pub fn push_group(&mut self) {
        if self.status.is_error() {
            return;
        }

        let group = Surface::new(self.target.format(), self.target.width(), self.target.height());
        let offset = self.target.device_offset();
        let scale = self.target.device_scale();
        group.set_device_offset(offset.x, offset.y);
        group.set_device_scale(scale.x, scale.y);

        self.save();
        let parent = std::mem::replace(&mut self.target, group);
        self.groups.push(Group {
            parent,
            depth: self.saved.len(),
        });
    }

    /// Finish the innermost group and return its contents as a surface pattern.
    ///
    /// The graphics state is restored to the one at the matching [Context::push_group].
    /// The pattern is positioned so that using it as the source right away reproduces
    /// the group exactly where it was drawn.
    #[must_use]
    pub fn pop_group(&mut self) -> Pattern {
        if self.status.is_error() {
            return Pattern::solid(Color::TRANSPARENT);
        }

        let Some(group) = self.groups.pop() else {
            self.status.set(Error::InvalidPopGroup);
            return Pattern::solid(Color::TRANSPARENT);
        };

        if group.depth != self.saved.len() {
            // A save inside the group was never restored
            self.groups.push(group);
            self.status.set(Error::InvalidPopGroup);
            return Pattern::solid(Color::TRANSPARENT);
        }

        let contents = std::mem::replace(&mut self.target, group.parent);
        self.restore();

        let mut pattern = Pattern::for_surface(&contents);
        let result = pattern.set_matrix(self.gstate.ctm);
        self.status.check(result);
        pattern
    }

    /// Finish the innermost group and use its contents as the source
    pub fn pop_group_to_source(&mut self) {
        let pattern = self.pop_group();
        self.set_source(&pattern);
    }

    // Transforms between coordinate spaces

    /// User space to device pixels, including the device transform of the target
    fn user_to_pixels(&self) -> AffineTransform {
        self.gstate.ctm.chain(self.target.device_transform())
    }

    fn pixels_to_user(&self) -> AffineTransform {
        let device_inverse = self
            .target
            .device_transform()
            .inverse()
            .unwrap_or_else(AffineTransform::identity);
        device_inverse.chain(self.gstate.ctm_inverse)
    }

    fn set_ctm(&mut self, ctm: AffineTransform) {
        if self.status.is_error() {
            return;
        }

        match ctm.inverse() {
            Some(inverse) => {
                self.gstate.ctm = ctm;
                self.gstate.ctm_inverse = inverse;
            },
            None => self.status.set(Error::InvalidMatrix),
        }
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.transform(AffineTransform::translate(Vec2D::new(tx, ty)));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.transform(AffineTransform::scale(sx, sy));
    }

    /// Rotate user space by `radians`, from the positive x axis towards the positive y axis
    pub fn rotate(&mut self, radians: f64) {
        self.transform(AffineTransform::rotate(Angle::from_radians(radians)));
    }

    /// Apply `matrix` to user space, before the current transformation
    pub fn transform(&mut self, matrix: AffineTransform) {
        self.set_ctm(matrix.chain(self.gstate.ctm));
    }

    pub fn set_matrix(&mut self, matrix: AffineTransform) {
        self.set_ctm(matrix);
    }

    pub fn identity_matrix(&mut self) {
        self.set_ctm(AffineTransform::identity());
    }

    /// The current transformation matrix, not including the device transform of the target
    #[inline]
    #[must_use]
    pub fn matrix(&self) -> AffineTransform {
        self.gstate.ctm
    }

    #[must_use]
    pub fn user_to_device(&self, point: Vec2D) -> Vec2D {
        self.gstate.ctm.apply_to(point)
    }

    #[must_use]
    pub fn user_to_device_distance(&self, distance: Vec2D) -> Vec2D {
        self.gstate.ctm.apply_to_distance(distance)
    }

    #[must_use]
    pub fn device_to_user(&self, point: Vec2D) -> Vec2D {
        self.gstate.ctm_inverse.apply_to(point)
    }

    #[must_use]
    pub fn device_to_user_distance(&self, distance: Vec2D) -> Vec2D {
        self.gstate.ctm_inverse.apply_to_distance(distance)
    }

    // Graphics state

    pub fn set_operator(&mut self, operator: Operator) {
        self.gstate.operator = operator;
    }

    #[inline]
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.gstate.operator
    }

    /// Use `pattern` as the source for all following drawing operations.
    ///
    /// The pattern is locked to the current user space, later changes to the
    /// transformation do not affect it.
    pub fn set_source(&mut self, pattern: &Pattern) {
        if self.status.is_error() {
            return;
        }
        self.gstate.source = pattern.clone();
        self.gstate.source_inverse = self.pixels_to_user();
    }

    pub fn set_source_rgb(&mut self, red: f64, green: f64, blue: f64) {
        self.set_source(&Pattern::solid(Color::rgb(red, green, blue)));
    }

    pub fn set_source_rgba(&mut self, red: f64, green: f64, blue: f64, alpha: f64) {
        self.set_source(&Pattern::solid(Color::rgba(red, green, blue, alpha)));
    }

    /// Use the contents of `surface` as the source, with its origin at `(x, y)` in user space
    pub fn set_source_surface(&mut self, surface: &Surface, x: f64, y: f64) {
        let mut pattern = Pattern::for_surface(surface);
        let result = pattern.set_matrix(AffineTransform::translate(Vec2D::new(-x, -y)));
        if self.status.check(result).is_some() {
            self.set_source(&pattern);
        }
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &Pattern {
        &self.gstate.source
    }

    /// Set the maximum error (in device pixels) when approximating curves
    pub fn set_tolerance(&mut self, tolerance: f64) {
        if tolerance.is_nan() {
            return;
        }
        self.gstate.tolerance = tolerance.max(MIN_TOLERANCE);
    }

    #[inline]
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.gstate.tolerance
    }

    pub fn set_antialias(&mut self, antialias: Antialias) {
        self.gstate.antialias = antialias;
    }

    #[inline]
    #[must_use]
    pub fn antialias(&self) -> Antialias {
        self.gstate.antialias
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.gstate.fill_rule = fill_rule;
    }

    #[inline]
    #[must_use]
    pub fn fill_rule(&self) -> FillRule {
        self.gstate.fill_rule
    }

    /// Negative widths are treated as zero
    pub fn set_line_width(&mut self, width: f64) {
        self.gstate.stroke_style.line_width = if width.is_nan() { 0. } else { width.max(0.) };
    }

    #[inline]
    #[must_use]
    pub fn line_width(&self) -> f64 {
        self.gstate.stroke_style.line_width
    }

    pub fn set_line_cap(&mut self, line_cap: LineCap) {
        self.gstate.stroke_style.line_cap = line_cap;
    }

    #[inline]
    #[must_use]
    pub fn line_cap(&self) -> LineCap {
        self.gstate.stroke_style.line_cap
    }

    pub fn set_line_join(&mut self, line_join: LineJoin) {
        self.gstate.stroke_style.line_join = line_join;
    }

    #[inline]
    #[must_use]
    pub fn line_join(&self) -> LineJoin {
        self.gstate.stroke_style.line_join
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        self.gstate.stroke_style.miter_limit = limit;
    }

    #[inline]
    #[must_use]
    pub fn miter_limit(&self) -> f64 {
        self.gstate.stroke_style.miter_limit
    }

    /// Set the dash pattern used by [Context::stroke], an empty pattern disables dashing
    pub fn set_dash(&mut self, dashes: &[f64], offset: f64) {
        if self.status.is_error() {
            return;
        }
        let result = self.gstate.stroke_style.set_dash(dashes, offset);
        self.status.check(result);
    }

    /// The dash pattern and its offset
    #[must_use]
    pub fn dash(&self) -> (&[f64], f64) {
        let style = &self.gstate.stroke_style;
        (style.dash(), style.dash_offset())
    }

    // Path construction

    pub fn new_path(&mut self) {
        self.path.clear();
    }

    pub fn new_sub_path(&mut self) {
        self.path.new_sub_path();
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        if self.status.is_error() {
            return;
        }
        let point = self.user_to_pixels().apply_to(Vec2D::new(x, y));
        self.path.move_to(point);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.status.is_error() {
            return;
        }
        let point = self.user_to_pixels().apply_to(Vec2D::new(x, y));
        self.path.line_to(point);
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        if self.status.is_error() {
            return;
        }
        let transform = self.user_to_pixels();
        self.path.curve_to(
            transform.apply_to(Vec2D::new(x1, y1)),
            transform.apply_to(Vec2D::new(x2, y2)),
            transform.apply_to(Vec2D::new(x3, y3)),
        );
    }

    /// The current point in device space, offset by a distance in user space
    fn relative_point(&mut self, dx: f64, dy: f64) -> Option<Vec2D> {
        if self.status.is_error() {
            return None;
        }

        let Some(current_point) = self.path.current_point() else {
            self.status.set(Error::NoCurrentPoint);
            return None;
        };

        let offset = self
            .user_to_pixels()
            .apply_to_distance(Vec2D::new(dx, dy));
        Some(current_point + offset)
    }

    pub fn rel_move_to(&mut self, dx: f64, dy: f64) {
        if let Some(point) = self.relative_point(dx, dy) {
            self.path.move_to(point);
        }
    }

    pub fn rel_line_to(&mut self, dx: f64, dy: f64) {
        if let Some(point) = self.relative_point(dx, dy) {
            self.path.line_to(point);
        }
    }

    /// Like [Context::curve_to], with all points relative to the current point
    pub fn rel_curve_to(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx3: f64, dy3: f64) {
        let (Some(c1), Some(c2), Some(end)) = (
            self.relative_point(dx1, dy1),
            self.relative_point(dx2, dy2),
            self.relative_point(dx3, dy3),
        ) else {
            return;
        };
        self.path.curve_to(c1, c2, end);
    }

    pub fn close_path(&mut self) {
        if self.status.is_error() {
            return;
        }
        self.path.close_path();
    }

    /// Add a closed rectangle as a new subpath
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.rel_line_to(width, 0.);
        self.rel_line_to(0., height);
        self.rel_line_to(-width, 0.);
        self.close_path();
    }

    /// Add a circular arc with increasing angles.
    ///
    /// If there is a current point, it is connected to the start of the arc
    /// with a straight line. If `angle2 < angle1`, `angle2` is increased by full
    /// turns until it is not.
    pub fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.add_arc(xc, yc, radius, angle1, angle2, ArcDirection::Positive);
    }

    /// Like [Context::arc], but with decreasing angles
    pub fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.add_arc(xc, yc, radius, angle1, angle2, ArcDirection::Negative);
    }

    fn add_arc(
        &mut self,
        xc: f64,
        yc: f64,
        radius: f64,
        angle1: f64,
        angle2: f64,
        direction: ArcDirection,
    ) {
        if self.status.is_error() {
            return;
        }

        if !(radius > 0.) {
            // A degenerate arc is a single point, the second line_to makes
            // sure it still gets caps when stroked
            self.line_to(xc, yc);
            self.line_to(xc, yc);
            return;
        }

        let Some(arc) = Arc::new(Vec2D::new(xc, yc), radius, angle1, angle2, direction) else {
            return;
        };

        let start = arc.start_point();
        self.line_to(start.x, start.y);

        let transform = self.user_to_pixels();
        let tolerance = self.gstate.tolerance / transform.max_scale_factor();
        for cubic in arc.to_cubics(tolerance) {
            self.path.curve_to(
                transform.apply_to(cubic.control1),
                transform.apply_to(cubic.control2),
                transform.apply_to(cubic.end),
            );
        }
    }

    /// A copy of the current path in user space
    #[must_use]
    pub fn copy_path(&self) -> Path {
        self.path.transformed(self.pixels_to_user())
    }

    /// Like [Context::copy_path], with curves approximated by straight lines
    /// according to the current tolerance
    #[must_use]
    pub fn copy_path_flat(&self) -> Path {
        self.path
            .flattened(self.gstate.tolerance)
            .transformed(self.pixels_to_user())
    }

    /// Append a path in user space, as returned by [Context::copy_path], to the current path
    pub fn append_path(&mut self, path: &Path) {
        if self.status.is_error() {
            return;
        }
        if path.subpaths().is_empty() && path.current_point().is_none() {
            return;
        }
        self.path.extend(&path.transformed(self.user_to_pixels()));
    }

    /// The current point in user space
    #[must_use]
    pub fn current_point(&self) -> Option<Vec2D> {
        let to_user = self.pixels_to_user();
        self.path.current_point().map(|point| to_user.apply_to(point))
    }

    /// Map a rectangle in device space to its bounding box in user space
    fn rectangle_to_user(&self, rectangle: Rectangle) -> Option<Rectangle> {
        let to_user = self.pixels_to_user();
        Rectangle::bounding_box(
            [
                rectangle.top_left(),
                rectangle.top_right(),
                rectangle.bottom_left(),
                rectangle.bottom_right(),
            ]
            .map(|corner| to_user.apply_to(corner)),
        )
    }

    /// The bounding box of the current path in user space, ignoring line width
    #[must_use]
    pub fn path_extents(&self) -> Option<Rectangle> {
        self.path
            .extents(self.gstate.tolerance)
            .and_then(|extents| self.rectangle_to_user(extents))
    }

    // Drawing

    /// Return `false` if drawing has to be skipped
    fn can_draw(&mut self) -> bool {
        if self.status.is_error() {
            log::debug!("Skipping drawing operation, context is in an error state");
            return false;
        }

        if self.target.is_finished() {
            self.status.set(Error::SurfaceFinished);
            return false;
        }

        true
    }

    fn draw(&mut self, coverage: Coverage<'_>, opacity: f64) {
        // The source is snapshotted before the target is borrowed, so the
        // target can be used as its own source
        let source = self.gstate.source.prepare(self.gstate.source_inverse);

        let request = Composite {
            operator: self.gstate.operator,
            source: &source,
            coverage,
            clip: self.clip.current(),
            antialias: self.gstate.antialias,
            opacity: opacity.clamp(0., 1.) as f32,
        };
        compositor::composite(&mut self.target.data_mut(), &request);
    }

    /// Paint the source everywhere inside the clip
    pub fn paint(&mut self) {
        self.paint_with_alpha(1.);
    }

    pub fn paint_with_alpha(&mut self, alpha: f64) {
        if !self.can_draw() {
            return;
        }
        self.draw(Coverage::Everything, alpha);
    }

    /// Paint the source, using the alpha channel of `pattern` as coverage.
    ///
    /// `pattern` is interpreted in the current user space.
    pub fn mask(&mut self, pattern: &Pattern) {
        if !self.can_draw() {
            return;
        }
        let mask = pattern.prepare(self.pixels_to_user());
        self.draw(Coverage::Alpha(&mask), 1.);
    }

    fn fill_traps(&self) -> Traps {
        let polygon = Polygon::from_path(&self.path, self.gstate.tolerance);
        tessellate(&polygon, self.gstate.fill_rule)
    }

    fn stroke_traps(&self) -> Traps {
        let polygon = stroke_to_polygon(
            &self.path,
            &self.gstate.stroke_style,
            self.user_to_pixels(),
            self.gstate.tolerance,
        );
        tessellate(&polygon, FillRule::Winding)
    }

    /// Fill the current path and clear it
    pub fn fill(&mut self) {
        self.fill_preserve();
        self.new_path();
    }

    /// Fill the current path, without clearing it
    pub fn fill_preserve(&mut self) {
        if !self.can_draw() {
            return;
        }
        let traps = self.fill_traps();
        self.draw(Coverage::Traps(&traps), 1.);
    }

    /// Stroke the current path and clear it
    pub fn stroke(&mut self) {
        self.stroke_preserve();
        self.new_path();
    }

    /// Stroke the current path, without clearing it
    pub fn stroke_preserve(&mut self) {
        if !self.can_draw() {
            return;
        }
        let traps = self.stroke_traps();
        self.draw(Coverage::Traps(&traps), 1.);
    }

    /// Restrict drawing to the inside of the current path and clear it
    pub fn clip(&mut self) {
        self.clip_preserve();
        self.new_path();
    }

    pub fn clip_preserve(&mut self) {
        if self.status.is_error() {
            return;
        }
        let polygon = Polygon::from_path(&self.path, self.gstate.tolerance);
        self.clip.push(&polygon, self.gstate.fill_rule);
    }

    /// Remove all clipping
    pub fn reset_clip(&mut self) {
        if self.status.is_error() {
            return;
        }
        self.clip.reset();
    }

    // Queries

    /// The area that would be covered by [Context::fill], in user space
    #[must_use]
    pub fn fill_extents(&self) -> Option<Rectangle> {
        self.fill_traps()
            .extents_f64()
            .and_then(|extents| self.rectangle_to_user(extents))
    }

    /// The area that would be covered by [Context::stroke], in user space
    #[must_use]
    pub fn stroke_extents(&self) -> Option<Rectangle> {
        self.stroke_traps()
            .extents_f64()
            .and_then(|extents| self.rectangle_to_user(extents))
    }

    /// The area drawing is restricted to, in user space.
    ///
    /// Without a clip, this is the whole target. Returns `None` if the clip is empty.
    #[must_use]
    pub fn clip_extents(&self) -> Option<Rectangle> {
        let region = self.clip.current();
        let extents = if region.is_unbounded() {
            let size = Vec2D::new(self.target.width() as f64, self.target.height() as f64);
            Rectangle::from_corners(Vec2D::new(0., 0.), size)
        } else {
            region.extents()?
        };
        self.rectangle_to_user(extents)
    }

    #[must_use]
    pub fn in_fill(&self, x: f64, y: f64) -> bool {
        let point = self.user_to_pixels().apply_to(Vec2D::new(x, y));
        self.fill_traps().contains_point(point)
    }

    #[must_use]
    pub fn in_stroke(&self, x: f64, y: f64) -> bool {
        let point = self.user_to_pixels().apply_to(Vec2D::new(x, y));
        self.stroke_traps().contains_point(point)
    }

    #[must_use]
    pub fn in_clip(&self, x: f64, y: f64) -> bool {
        let point = self.user_to_pixels().apply_to(Vec2D::new(x, y));
        self.clip.current().contains_point(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Format, Segment};

    fn context(width: usize, height: usize) -> (Surface, Context) {
        let surface = Surface::new(Format::Argb32, width, height);
        let context = Context::new(&surface);
        (surface, context)
    }

    #[test]
    fn fill_rectangle() {
        let (surface, mut context) = context(10, 10);
        context.set_source_rgb(0., 1., 0.);
        context.rectangle(2., 2., 4., 4.);
        context.fill();

        assert_eq!(surface.pixel(3, 3), Some(0xFF00_FF00));
        assert_eq!(surface.pixel(6, 6), Some(0));
        assert_eq!(context.path_extents(), None);
    }

    #[test]
    fn transformed_fill() {
        let (surface, mut context) = context(10, 10);
        context.translate(5., 0.);
        context.scale(2., 2.);
        context.rectangle(0., 0., 1., 1.);

        let extents = context.fill_extents().unwrap();
        assert_eq!(extents.top_left(), Vec2D::new(0., 0.));
        assert_eq!(extents.bottom_right(), Vec2D::new(1., 1.));
        assert!(context.in_fill(0.5, 0.5));
        assert!(!context.in_fill(1.5, 0.5));

        context.fill();
        assert_eq!(surface.pixel(5, 1), Some(0xFF00_0000));
        assert_eq!(surface.pixel(7, 1), Some(0));
    }

    #[test]
    fn relative_operations_need_a_current_point() {
        let (_, mut context) = context(1, 1);
        context.rel_line_to(1., 1.);
        assert_eq!(context.status(), Err(Error::NoCurrentPoint));

        // Once in an error state, nothing happens anymore
        context.move_to(0., 0.);
        assert_eq!(context.current_point(), None);
    }

    #[test]
    fn close_path_moves_to_start() {
        let (_, mut context) = context(1, 1);
        context.move_to(1., 2.);
        context.line_to(5., 2.);
        context.close_path();
        assert_eq!(context.current_point(), Some(Vec2D::new(1., 2.)));
        context.rel_line_to(0., 3.);
        assert_eq!(context.current_point(), Some(Vec2D::new(1., 5.)));
    }

    #[test]
    fn singular_matrix() {
        let (_, mut context) = context(1, 1);
        context.scale(0., 1.);
        assert_eq!(context.status(), Err(Error::InvalidMatrix));
        assert_eq!(context.matrix(), AffineTransform::identity());
    }

    #[test]
    fn save_restore() {
        let (_, mut context) = context(10, 10);
        context.set_line_width(5.);
        context.save();
        context.set_line_width(1.);
        context.translate(3., 3.);
        context.rectangle(0., 0., 2., 2.);
        context.clip();
        assert!(context.in_clip(1., 1.));
        assert!(!context.in_clip(-1., -1.));

        context.restore();
        assert_eq!(context.line_width(), 5.);
        assert_eq!(context.matrix(), AffineTransform::identity());
        assert!(context.in_clip(0., 0.));
        assert_eq!(context.status(), Ok(()));

        context.restore();
        assert_eq!(context.status(), Err(Error::InvalidRestore));
    }

    #[test]
    fn arc_with_zero_radius() {
        let (_, mut context) = context(1, 1);
        context.arc(3., 4., 0., 0., 1.);
        assert_eq!(context.current_point(), Some(Vec2D::new(3., 4.)));
        assert_eq!(
            context.path_extents(),
            Some(Rectangle::from_corners(
                Vec2D::new(3., 4.),
                Vec2D::new(3., 4.)
            ))
        );
    }

    #[test]
    fn arc_negative_goes_the_other_way() {
        let (_, mut context) = context(1, 1);
        context.arc_negative(0., 0., 10., 0., std::f64::consts::FRAC_PI_2);

        // Three quarters of a circle, through the top
        let extents = context.path_extents().unwrap();
        let tolerance = context.tolerance() + 1e-9;
        assert!((extents.top_left().y + 10.).abs() <= tolerance);
        assert!((extents.bottom_right().y - 10.).abs() <= tolerance);
        assert!((extents.top_left().x + 10.).abs() <= tolerance);
        assert!((extents.bottom_right().x - 10.).abs() <= tolerance);
    }

    #[test]
    fn stroke_queries() {
        let (_, mut context) = context(1, 1);
        context.set_line_width(4.);
        context.move_to(0., 0.);
        context.line_to(10., 0.);

        assert!(context.in_stroke(5., 1.5));
        assert!(!context.in_stroke(5., 2.5));

        let extents = context.stroke_extents().unwrap();
        assert_eq!(extents.top_left(), Vec2D::new(0., -2.));
        assert_eq!(extents.bottom_right(), Vec2D::new(10., 2.));
    }

    #[test]
    fn clip_extents() {
        let (_, mut context) = context(30, 20);
        assert_eq!(
            context.clip_extents(),
            Some(Rectangle::from_corners(
                Vec2D::new(0., 0.),
                Vec2D::new(30., 20.)
            ))
        );

        context.scale(2., 2.);
        context.rectangle(1., 1., 2., 2.);
        context.clip();
        assert_eq!(
            context.clip_extents(),
            Some(Rectangle::from_corners(
                Vec2D::new(1., 1.),
                Vec2D::new(3., 3.)
            ))
        );
    }

    #[test]
    fn finished_targets() {
        let (surface, mut context) = context(1, 1);
        surface.finish();
        context.paint();
        assert_eq!(context.status(), Err(Error::SurfaceFinished));
    }

    #[test]
    fn invalid_targets() {
        let surface = Surface::new(Format::Argb32, 100_000, 1);
        let mut context = Context::new(&surface);
        context.paint();
        assert_eq!(context.status(), Err(Error::InvalidSize));
    }

    #[test]
    fn device_offset() {
        let (surface, mut context) = context(10, 10);
        surface.set_device_offset(5., 5.);
        context.rectangle(0., 0., 1., 1.);
        context.fill();
        assert_eq!(surface.pixel(5, 5), Some(0xFF00_0000));
        assert_eq!(surface.pixel(0, 0), Some(0));
    }

    #[test]
    fn options_set_the_initial_state() {
        let surface = Surface::new(Format::Argb32, 1, 1);
        let options = Options {
            tolerance: 0.5,
            fill_rule: FillRule::EvenOdd,
            line_width: 7.,
            line_cap: LineCap::Round,
            line_join: LineJoin::Bevel,
            miter_limit: 3.,
            ..Options::default()
        };
        let context = Context::with_options(&surface, options);

        assert_eq!(context.tolerance(), 0.5);
        assert_eq!(context.fill_rule(), FillRule::EvenOdd);
        assert_eq!(context.line_width(), 7.);
        assert_eq!(context.line_cap(), LineCap::Round);
        assert_eq!(context.line_join(), LineJoin::Bevel);
        assert_eq!(context.miter_limit(), 3.);
        assert!(context.dash().0.is_empty());
    }

    #[test]
    fn groups_are_composited_on_pop() {
        let (surface, mut context) = context(10, 10);
        context.set_source_rgb(1., 0., 0.);
        context.paint();

        context.push_group();
        assert!(context.target().ptr_eq(&surface));
        assert!(!context.group_target().ptr_eq(&surface));

        context.set_source_rgb(0., 0., 1.);
        context.rectangle(2., 2., 4., 4.);
        context.fill();
        assert_eq!(surface.pixel(3, 3), Some(0xFFFF_0000));
        assert_eq!(context.group_target().pixel(3, 3), Some(0xFF00_00FF));
        assert_eq!(context.group_target().pixel(0, 0), Some(0));

        context.pop_group_to_source();
        assert!(context.group_target().ptr_eq(&surface));
        context.paint();

        assert_eq!(context.status(), Ok(()));
        assert_eq!(surface.pixel(3, 3), Some(0xFF00_00FF));
        assert_eq!(surface.pixel(0, 0), Some(0xFFFF_0000));
        assert_eq!(surface.pixel(7, 7), Some(0xFFFF_0000));
    }

    #[test]
    fn groups_restore_the_graphics_state() {
        let (surface, mut context) = context(10, 10);
        context.translate(5., 5.);
        context.push_group();
        context.set_line_width(9.);
        context.rectangle(0., 0., 1., 1.);
        context.fill();

        let pattern = context.pop_group();
        assert_eq!(context.line_width(), 2.);
        assert_eq!(pattern.matrix(), context.matrix());

        // The group shows up where it was drawn, even under a translation
        context.set_source(&pattern);
        context.paint();
        assert_eq!(surface.pixel(5, 5), Some(0xFF00_0000));
        assert_eq!(surface.pixel(4, 4), Some(0));
        assert_eq!(context.status(), Ok(()));
    }

    #[test]
    fn unbalanced_groups() {
        {
            let (_, mut context) = context(1, 1);
            let _ = context.pop_group();
            assert_eq!(context.status(), Err(Error::InvalidPopGroup));
        }
        {
            let (_, mut context) = context(1, 1);
            context.push_group();
            context.restore();
            assert_eq!(context.status(), Err(Error::InvalidRestore));
        }
        {
            let (_, mut context) = context(1, 1);
            context.push_group();
            context.save();
            let _ = context.pop_group();
            assert_eq!(context.status(), Err(Error::InvalidPopGroup));
        }
    }

    fn assert_points_close(a: Vec2D, b: Vec2D) {
        assert!(a.distance_to(b) < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn copied_paths_are_in_user_space() {
        let (surface, mut context) = context(20, 20);
        context.translate(5., 1.);
        context.scale(2., 2.);
        context.rectangle(1., 1., 2., 3.);

        let path = context.copy_path();
        assert_eq!(path.subpaths().len(), 1);
        let rectangle = &path.subpaths()[0];
        assert!(rectangle.is_closed());
        assert_points_close(rectangle.start(), Vec2D::new(1., 1.));
        let corners = [Vec2D::new(3., 1.), Vec2D::new(3., 4.), Vec2D::new(1., 4.)];
        assert_eq!(rectangle.segments().len(), corners.len());
        for (segment, corner) in rectangle.segments().iter().zip(corners) {
            assert!(matches!(segment, Segment::Line(_)));
            assert_points_close(segment.end(), corner);
        }

        // Appending interprets the path in the current user space
        context.new_path();
        context.identity_matrix();
        context.append_path(&path);
        assert_points_close(
            context.current_point().expect("path was appended"),
            Vec2D::new(1., 1.),
        );
        context.fill();
        assert_eq!(surface.pixel(1, 1), Some(0xFF00_0000));
        assert_eq!(surface.pixel(2, 3), Some(0xFF00_0000));
        assert_eq!(surface.pixel(3, 1), Some(0));
        assert_eq!(surface.pixel(8, 4), Some(0));
    }

    #[test]
    fn copy_and_append_under_a_transform() {
        let (_, mut context) = context(1, 1);
        context.rotate(0.3);
        context.scale(3., 0.5);
        context.move_to(1., 2.);
        context.curve_to(4., 2., 5., 6., 7., 1.);
        context.line_to(0., 0.);

        let path = context.copy_path();
        context.new_path();
        context.append_path(&path);
        let copied_again = context.copy_path();

        assert_eq!(copied_again.subpaths().len(), 1);
        let (before, after) = (&path.subpaths()[0], &copied_again.subpaths()[0]);
        assert_points_close(before.start(), after.start());
        for (a, b) in before.segments().iter().zip(after.segments()) {
            assert_points_close(a.end(), b.end());
        }
    }

    #[test]
    fn flat_copies_contain_no_curves() {
        let (_, mut context) = context(1, 1);
        context.scale(2., 2.);
        context.arc(10., 10., 5., 0., std::f64::consts::PI);

        let curved = context.copy_path();
        assert!(curved.subpaths()[0]
            .segments()
            .iter()
            .any(|segment| matches!(segment, Segment::Cubic(..))));

        let flat = context.copy_path_flat();
        let segments = flat.subpaths()[0].segments();
        assert!(segments.len() > curved.subpaths()[0].segments().len());
        assert!(segments
            .iter()
            .all(|segment| matches!(segment, Segment::Line(_))));
        assert_points_close(
            segments[segments.len() - 1].end(),
            Vec2D::new(5., 10.),
        );

        // Every point lies on the circle, in user space
        for segment in segments {
            let distance = segment.end().distance_to(Vec2D::new(10., 10.));
            assert!((distance - 5.).abs() <= context.tolerance());
        }
    }
}
