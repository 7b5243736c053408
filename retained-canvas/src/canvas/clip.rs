//! Clip operations for Canvas.
//!
//! Rectangles and paths are given in user space and mapped through the
//! current matrix; regions are already in device space. The stored clip is
//! always device space.

use super::Canvas;
use crate::clip::ClipKind;
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::Rect;
use crate::path::Path;
use crate::region::Region;

impl Canvas {
    /// Device-space shape of a user-space rectangle: a rectangle when the
    /// matrix keeps it axis-aligned, a path otherwise.
    pub(super) fn device_rect(&self, rect: Rect) -> CanvasResult<Result<Rect, Path>> {
        if !rect.is_finite() {
            return Err(CanvasError::InvalidParameter(format!(
                "non-finite rectangle {rect:?}"
            )));
        }
        let matrix = self.state.matrix;
        if matrix.preserves_axis_alignment() {
            Ok(Ok(matrix.map_rect(&rect)?))
        } else {
            Ok(Err(Path::from_rect(rect).transformed(&matrix)?))
        }
    }

    /// Intersect the clip with a user-space rectangle.
    pub fn clip_rect(&mut self, rect: Rect, anti_alias: bool) -> CanvasResult<()> {
        log::debug!(target: "canvas", "clip_rect {:?}", rect);
        match self.device_rect(rect)? {
            Ok(rect) => self.state.clip.intersect_rect(rect, anti_alias),
            Err(path) => self.state.clip.intersect_path(path, anti_alias),
        }
        Ok(())
    }

    /// Intersect the clip with a user-space path, honouring its fill rule.
    pub fn clip_path(&mut self, path: &Path, anti_alias: bool) -> CanvasResult<()> {
        log::debug!(target: "canvas", "clip_path");
        let device = path.transformed(&self.state.matrix)?;
        self.state.clip.intersect_path(device, anti_alias);
        Ok(())
    }

    /// Intersect the clip with a device-space region.
    pub fn clip_region(&mut self, region: &Region) {
        log::debug!(target: "canvas", "clip_region {} rect(s)", region.rects().len());
        self.state.clip.intersect_region(region);
    }

    /// Remove a user-space rectangle from the clip.
    pub fn clip_out_rect(&mut self, rect: Rect, anti_alias: bool) -> CanvasResult<()> {
        log::debug!(target: "canvas", "clip_out_rect {:?}", rect);
        match self.device_rect(rect)? {
            Ok(rect) => self.state.clip.subtract_rect(rect, anti_alias),
            Err(path) => self.state.clip.subtract_path(path, anti_alias),
        }
        Ok(())
    }

    /// Remove a user-space path from the clip.
    pub fn clip_out_path(&mut self, path: &Path, anti_alias: bool) -> CanvasResult<()> {
        log::debug!(target: "canvas", "clip_out_path");
        let device = path.transformed(&self.state.matrix)?;
        self.state.clip.subtract_path(device, anti_alias);
        Ok(())
    }

    /// Remove a device-space region from the clip.
    pub fn clip_out_region(&mut self, region: &Region) {
        log::debug!(target: "canvas", "clip_out_region {} rect(s)", region.rects().len());
        self.state.clip.subtract_region(region);
    }

    /// Device-space bounds of the clip, or `None` while unrestricted.
    pub fn clip_bounds(&self) -> Option<Rect> {
        self.state.clip.bounds()
    }

    pub fn is_clip_empty(&self) -> bool {
        self.state.clip.is_empty()
    }

    pub fn is_clip_rect(&self) -> bool {
        self.state.clip.is_rect()
    }

    pub fn is_clip_path(&self) -> bool {
        self.state.clip.is_path()
    }

    pub fn is_clip_region(&self) -> bool {
        self.state.clip.is_region()
    }

    pub fn is_clip_out(&self) -> bool {
        self.state.clip.is_clip_out()
    }

    pub fn clip_kind(&self) -> ClipKind {
        self.state.clip.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_nested_clip_scenario() {
        let mut canvas = Canvas::new();
        canvas.save();
        canvas.clip_rect(Rect::new(0.0, 0.0, 50.0, 50.0), false).unwrap();
        canvas.save();
        canvas.clip_rect(Rect::new(25.0, 25.0, 50.0, 50.0), false).unwrap();
        assert_eq!(canvas.clip_bounds(), Some(Rect::new(25.0, 25.0, 25.0, 25.0)));
        canvas.restore();
        assert_eq!(canvas.clip_bounds(), Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
        canvas.restore();
        assert_eq!(canvas.clip_bounds(), None);
    }

    #[test]
    fn test_sequential_clips_match_intersection() {
        let a = Rect::new(0.0, 0.0, 40.0, 30.0);
        let b = Rect::new(10.0, 5.0, 60.0, 60.0);

        let mut sequential = Canvas::new();
        sequential.clip_rect(a, false).unwrap();
        sequential.clip_rect(b, false).unwrap();

        let mut single = Canvas::new();
        single.clip_rect(a.intersection(&b).unwrap(), false).unwrap();

        assert_eq!(sequential.clip_bounds(), single.clip_bounds());
    }

    #[test]
    fn test_clip_rect_follows_matrix() {
        let mut canvas = Canvas::new();
        canvas.translate(10.0, 0.0);
        canvas.scale(2.0, 2.0);
        canvas.clip_rect(Rect::new(0.0, 0.0, 5.0, 5.0), false).unwrap();
        assert_eq!(canvas.clip_bounds(), Some(Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(canvas.is_clip_rect());
    }

    #[test]
    fn test_rotated_clip_rect_becomes_path() {
        let mut canvas = Canvas::new();
        canvas.rotate(FRAC_PI_4);
        canvas.clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0), true).unwrap();
        assert!(canvas.is_clip_path());
        // Corner of the bounding box lies outside the rotated square.
        assert!(!canvas.state().clip.contains(Point::new(6.0, 1.0)));
        assert!(canvas.state().clip.contains(Point::new(0.0, 7.0)));
    }

    #[test]
    fn test_clip_out_rect_excludes_interior() {
        let mut canvas = Canvas::new();
        canvas.clip_rect(Rect::new(0.0, 0.0, 100.0, 100.0), false).unwrap();
        canvas.clip_out_rect(Rect::new(20.0, 20.0, 10.0, 10.0), false).unwrap();
        assert!(canvas.is_clip_out());
        assert!(!canvas.is_clip_rect());
        assert!(!canvas.contains_point(Point::new(25.0, 25.0)));
        assert!(canvas.contains_point(Point::new(5.0, 5.0)));
        assert_eq!(canvas.clip_bounds(), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn test_clip_out_path() {
        let mut canvas = Canvas::new();
        let mut hole = Path::new();
        hole.add_circle(Point::new(50.0, 50.0), 10.0);
        canvas.clip_out_path(&hole, true).unwrap();
        assert!(!canvas.contains_point(Point::new(50.0, 50.0)));
        assert!(canvas.contains_point(Point::new(70.0, 50.0)));
    }

    #[test]
    fn test_clip_region_device_space() {
        let mut canvas = Canvas::new();
        canvas.scale(10.0, 10.0);
        let region = Region::from_rects([
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(20.0, 0.0, 10.0, 10.0),
        ]);
        canvas.clip_region(&region);
        assert!(canvas.is_clip_region());
        assert_eq!(canvas.clip_bounds(), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
        canvas.clip_out_region(&Region::from_rect(Rect::new(0.0, 0.0, 5.0, 5.0)));
        assert!(canvas.is_clip_out());
    }

    #[test]
    fn test_disjoint_clips_empty() {
        let mut canvas = Canvas::new();
        canvas.clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0), false).unwrap();
        canvas.clip_rect(Rect::new(20.0, 20.0, 10.0, 10.0), false).unwrap();
        assert!(canvas.is_clip_empty());
        canvas.clip_rect(Rect::new(0.0, 0.0, 100.0, 100.0), false).unwrap();
        assert!(canvas.is_clip_empty());
    }

    #[test]
    fn test_non_finite_clip_rejected() {
        let mut canvas = Canvas::new();
        let err = canvas
            .clip_rect(Rect::new(f64::NAN, 0.0, 1.0, 1.0), false)
            .unwrap_err();
        assert!(matches!(err, CanvasError::InvalidParameter(_)));
        assert_eq!(canvas.clip_bounds(), None);
    }
}
