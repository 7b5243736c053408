//! Measurement, hit testing and state queries for Canvas.

use super::Canvas;
use crate::error::CanvasResult;
use crate::geometry::{Point, Rect, Size};
use crate::text::{TextBlob, TextMetrics, TextRun};

impl Canvas {
    // --- Text measurement (live paint's text style) ---

    pub fn measure_text(&self, text: &str) -> TextMetrics {
        self.shaper.measure(text, self.state.paint.text())
    }

    pub fn measure_text_width(&self, text: &str) -> f64 {
        self.measure_text(text).width
    }

    pub fn measure_text_height(&self, text: &str) -> f64 {
        self.measure_text(text).height()
    }

    /// User-space box `fill_text(text, Point::ZERO)` would cover, after
    /// alignment and baseline are applied.
    pub fn text_bounds(&self, text: &str) -> Rect {
        let style = self.state.paint.text();
        let metrics = self.shaper.measure(text, style);
        let anchor = metrics.anchor_offset(style.align, style.baseline);
        metrics.bounds().translate(anchor.x, anchor.y)
    }

    pub fn text_runs(&self, text: &str) -> Vec<TextRun> {
        self.measure_text(text).runs
    }

    /// Shape `text` once for repeated `draw_text_blob` calls.
    pub fn make_text_blob(&self, text: &str) -> TextBlob {
        self.shaper.shape(text, self.state.paint.text())
    }

    // --- Hit testing (user-space arguments) ---

    /// Whether a user-space point lands inside the clip and, when a surface
    /// is bound, inside the surface.
    pub fn contains_point(&self, p: Point) -> bool {
        let Ok(device) = self.state.matrix.map_point(p) else {
            return false;
        };
        self.state.clip.contains(device)
            && self.surface.as_ref().map_or(true, |s| s.contains_point(device))
    }

    /// Whether all of a user-space rectangle is drawable.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        let Ok(device) = self.state.matrix.map_rect(rect) else {
            return false;
        };
        self.state.clip.contains_rect(&device)
            && self.surface.as_ref().map_or(true, |s| s.contains_rect(&device))
    }

    /// Whether any of a user-space rectangle may be drawable.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        let Ok(device) = self.state.matrix.map_rect(rect) else {
            return false;
        };
        self.state.clip.intersects_rect(&device)
            && self
                .surface
                .as_ref()
                .map_or(true, |s| s.intersects_rect(&device))
    }

    /// User space to device space. A point the matrix sends to infinity is
    /// returned unchanged.
    pub fn map_point(&self, p: Point) -> Point {
        self.state.matrix.map_point(p).unwrap_or_else(|err| {
            log::debug!(target: "canvas", "map_point fallback: {err}");
            p
        })
    }

    /// Bounding box of a mapped user-space rectangle, or the rectangle
    /// unchanged when a corner cannot be mapped.
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        self.state.matrix.map_rect(rect).unwrap_or_else(|err| {
            log::debug!(target: "canvas", "map_rect fallback: {err}");
            *rect
        })
    }

    /// Device space to user space.
    ///
    /// When the matrix is singular the point is returned unchanged (identity
    /// pass-through); use [`Canvas::try_unmap_point`] to detect that case.
    pub fn unmap_point(&self, p: Point) -> Point {
        self.try_unmap_point(p).unwrap_or_else(|err| {
            log::debug!(target: "canvas", "unmap_point fallback: {err}");
            p
        })
    }

    /// Like [`Canvas::unmap_point`], reporting a singular matrix as
    /// `InvalidOperation`.
    pub fn try_unmap_point(&self, p: Point) -> CanvasResult<Point> {
        self.state.matrix.invert()?.map_point(p)
    }

    /// Bounding box of a device-space rectangle in user space, with the same
    /// identity fallback as [`Canvas::unmap_point`].
    pub fn unmap_rect(&self, rect: &Rect) -> Rect {
        self.state
            .matrix
            .invert()
            .and_then(|inverse| inverse.map_rect(rect))
            .unwrap_or_else(|err| {
                log::debug!(target: "canvas", "unmap_rect fallback: {err}");
                *rect
            })
    }

    // --- State ---

    pub fn is_valid(&self) -> bool {
        self.state.valid
    }

    /// Bound to a surface that can take more work.
    pub fn is_ready(&self) -> bool {
        self.state.ready && self.surface.is_some() && !self.is_full()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty
    }

    /// True when nothing drawn now could reach a pixel.
    pub fn is_empty(&self) -> bool {
        self.visible_bounds().map_or(true, |r| r.is_empty())
    }

    pub fn is_full(&self) -> bool {
        self.surface.as_ref().is_some_and(|s| s.is_full())
    }

    pub fn is_clipped(&self) -> bool {
        !self.state.clip.is_unbounded()
    }

    pub fn is_transformed(&self) -> bool {
        !self.state.matrix.is_identity()
    }

    pub fn is_scaled(&self) -> bool {
        self.state.matrix.is_scaled()
    }

    pub fn is_rotated(&self) -> bool {
        self.state.matrix.is_rotated()
    }

    pub fn is_skewed(&self) -> bool {
        self.state.matrix.is_skewed()
    }

    // --- Geometry ---

    /// Surface size, or zero without a surface.
    pub fn size(&self) -> Size {
        self.surface
            .as_ref()
            .map_or(Size::new(0.0, 0.0), |s| s.size())
    }

    pub fn width(&self) -> f64 {
        self.size().width
    }

    pub fn height(&self) -> f64 {
        self.size().height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.size())
    }

    /// Device-space area a draw could touch: the surface bounds narrowed by
    /// the clip bounds. `None` when the clip is empty or nothing limits
    /// drawing at all.
    pub fn visible_bounds(&self) -> Option<Rect> {
        if self.state.clip.is_empty() {
            return None;
        }
        let surface = self.surface.as_ref().map(|s| s.bounds());
        match (surface, self.state.clip.bounds()) {
            (Some(surface), Some(clip)) => surface.intersection(&clip),
            (surface, clip) => surface.or(clip),
        }
    }

    /// Device-space union of everything submitted since the last flush,
    /// finish, sync or wait.
    pub fn dirty_bounds(&self) -> Option<Rect> {
        self.dirty_bounds
    }

    /// Device-space area whose surface contents cannot be trusted yet: the
    /// whole canvas while it is invalid, otherwise the dirty bounds.
    pub fn invalid_bounds(&self) -> Option<Rect> {
        if self.state.valid {
            self.dirty_bounds
        } else {
            Some(self.bounds())
        }
    }

    pub fn scale_x(&self) -> f64 {
        self.state.matrix.scale_x()
    }

    pub fn scale_y(&self) -> f64 {
        self.state.matrix.scale_y()
    }

    /// Rotation of the x axis in radians.
    pub fn rotation(&self) -> f64 {
        self.state.matrix.rotation_angle()
    }

    pub fn skew_x(&self) -> f64 {
        self.state.matrix.skew_x()
    }

    pub fn skew_y(&self) -> f64 {
        self.state.matrix.skew_y()
    }

    pub fn translation(&self) -> Point {
        self.state.matrix.translation_offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CanvasError;
    use crate::matrix::Matrix;
    use crate::style::{TextAlign, TextBaseline};
    use crate::surface::RecordingSurface;
    use crate::text::ApproximateShaper;
    use rstest::rstest;
    use std::sync::Arc;

    fn assert_point_eq(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6,
            "{a:?} != {b:?}"
        );
    }

    #[rstest]
    #[case(Matrix::translation(3.0, -7.0))]
    #[case(Matrix::rotation(0.7) * Matrix::scaling(2.0, 0.5))]
    #[case(Matrix::skewing(0.3, 0.1) * Matrix::translation(1.0, 1.0))]
    #[case(Matrix::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.001, 0.0, 1.0))]
    fn test_map_unmap_round_trip(#[case] matrix: Matrix) {
        let mut canvas = Canvas::new();
        canvas.set_matrix(matrix);
        for p in [Point::new(0.0, 0.0), Point::new(12.5, -3.0), Point::new(40.0, 90.0)] {
            assert_point_eq(canvas.map_point(canvas.unmap_point(p)), p);
        }
    }

    #[test]
    fn test_unmap_singular_passes_through() {
        let mut canvas = Canvas::new();
        canvas.scale(0.0, 1.0);
        let p = Point::new(4.0, 5.0);
        assert_eq!(canvas.unmap_point(p), p);
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(canvas.unmap_rect(&rect), rect);
        assert!(matches!(
            canvas.try_unmap_point(p),
            Err(CanvasError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_hit_testing_respects_surface() {
        let surface = Arc::new(RecordingSurface::new(Size::new(50.0, 50.0)));
        let mut canvas = Canvas::from_surface(surface);
        assert!(canvas.contains_point(Point::new(10.0, 10.0)));
        assert!(!canvas.contains_point(Point::new(60.0, 10.0)));
        assert!(canvas.contains_rect(&Rect::new(0.0, 0.0, 50.0, 50.0)));
        assert!(!canvas.contains_rect(&Rect::new(40.0, 40.0, 20.0, 20.0)));
        assert!(canvas.intersects_rect(&Rect::new(40.0, 40.0, 20.0, 20.0)));

        canvas.translate(100.0, 0.0);
        assert!(!canvas.contains_point(Point::new(10.0, 10.0)));
        assert!(!canvas.intersects_rect(&Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_state_queries() {
        let mut canvas = Canvas::new();
        assert!(!canvas.is_ready());
        assert!(!canvas.is_transformed());
        assert!(!canvas.is_clipped());
        assert!(canvas.is_empty());

        canvas.set_surface(Some(Arc::new(RecordingSurface::new(Size::new(20.0, 10.0)))));
        assert!(canvas.is_ready());
        assert!(!canvas.is_empty());
        assert_eq!(canvas.width(), 20.0);
        assert_eq!(canvas.height(), 10.0);
        assert_eq!(canvas.visible_bounds(), Some(Rect::new(0.0, 0.0, 20.0, 10.0)));

        canvas.rotate(0.25);
        canvas.scale(2.0, 3.0);
        assert!(canvas.is_transformed());
        assert!(canvas.is_rotated());
        assert!(canvas.is_scaled());
        assert!(!canvas.is_skewed());
        assert!((canvas.rotation() - 0.25).abs() < 1e-9);
        assert!((canvas.scale_x() - 2.0).abs() < 1e-9);
        assert!((canvas.scale_y() - 3.0).abs() < 1e-9);

        canvas.reset_matrix();
        canvas.skew(0.5, 0.0);
        assert!(canvas.is_skewed());
        assert_eq!(canvas.skew_x(), 0.5);
        assert_eq!(canvas.skew_y(), 0.0);

        canvas.reset_matrix();
        canvas.translate(4.0, 6.0);
        assert_eq!(canvas.translation(), Point::new(4.0, 6.0));

        canvas.clip_rect(Rect::new(5.0, 0.0, 100.0, 100.0), false).unwrap();
        assert!(canvas.is_clipped());
        assert_eq!(canvas.visible_bounds(), Some(Rect::new(9.0, 6.0, 11.0, 4.0)));
    }

    #[test]
    fn test_text_measurement() {
        let mut canvas = Canvas::new();
        canvas.set_text_shaper(Arc::new(ApproximateShaper::new(0.5)));
        canvas.paint_mut().set_text_size(20.0);
        assert_eq!(canvas.measure_text_width("abc"), 30.0);
        assert!((canvas.measure_text_height("abc") - 20.0).abs() < 1e-9);
        assert_eq!(canvas.text_runs("a\nbc").len(), 2);

        canvas.paint_mut().set_text_align(TextAlign::Center);
        canvas.paint_mut().set_text_baseline(TextBaseline::Top);
        let bounds = canvas.text_bounds("abcd");
        assert_eq!(bounds.x, -20.0);
        assert!(bounds.y.abs() < 1e-9);

        let blob = canvas.make_text_blob("abcd");
        assert_eq!(blob.metrics().width, 40.0);
    }

    #[test]
    fn test_dirty_bounds_accumulate_and_clear() {
        let surface = Arc::new(RecordingSurface::new(Size::new(100.0, 100.0)));
        let mut canvas = Canvas::from_surface(surface);
        canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        canvas.fill_rect(Rect::new(50.0, 50.0, 100.0, 10.0)).unwrap();
        assert_eq!(canvas.dirty_bounds(), Some(Rect::new(0.0, 0.0, 100.0, 60.0)));
        canvas.wait().unwrap();
        assert_eq!(canvas.dirty_bounds(), None);
    }

    #[test]
    fn test_invalid_bounds() {
        let surface = Arc::new(RecordingSurface::new(Size::new(100.0, 50.0)));
        let mut canvas = Canvas::from_surface(surface);
        assert_eq!(canvas.invalid_bounds(), None);
        canvas.fill_rect(Rect::new(10.0, 10.0, 5.0, 5.0)).unwrap();
        assert_eq!(canvas.invalid_bounds(), Some(Rect::new(10.0, 10.0, 5.0, 5.0)));

        canvas.invalidate();
        assert_eq!(canvas.invalid_bounds(), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert!(canvas.validate());
        canvas.flush().unwrap();
        assert_eq!(canvas.invalid_bounds(), None);
    }
}
