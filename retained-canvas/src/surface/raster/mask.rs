//! Clip masks for the raster surface.

use crate::clip::{Clip, ClipOp, ClipShape};
use crate::error::{CanvasError, CanvasResult};
use crate::path::Path;

/// How a clip constrains a raster draw.
pub(super) enum ClipMask {
    /// Nothing is clipped.
    Unclipped,
    /// Everything is clipped; skip the draw.
    Empty,
    Mask(tiny_skia::Mask),
}

impl ClipMask {
    pub(super) fn as_ref(&self) -> Option<&tiny_skia::Mask> {
        match self {
            ClipMask::Mask(mask) => Some(mask),
            ClipMask::Unclipped | ClipMask::Empty => None,
        }
    }

    pub(super) fn is_empty(&self) -> bool {
        matches!(self, ClipMask::Empty)
    }
}

/// Rasterize a device-space clip into a coverage mask.
pub(super) fn clip_mask(clip: &Clip, width: u32, height: u32) -> CanvasResult<ClipMask> {
    if clip.is_empty() {
        return Ok(ClipMask::Empty);
    }
    if clip.is_unbounded() {
        return Ok(ClipMask::Unclipped);
    }

    let mut mask = tiny_skia::Mask::new(width, height).ok_or(CanvasError::OutOfMemory)?;
    match clip.bounds() {
        Some(bound) => {
            let Some(rect) = bound.to_skia() else {
                return Ok(ClipMask::Empty);
            };
            let path = tiny_skia::PathBuilder::from_rect(rect);
            mask.fill_path(
                &path,
                tiny_skia::FillRule::Winding,
                clip.is_anti_aliased(),
                tiny_skia::Transform::identity(),
            );
        }
        None => mask.data_mut().fill(255),
    }

    for element in clip.elements() {
        let shape = match &element.shape {
            ClipShape::Rect(rect) => Path::from_rect(*rect),
            ClipShape::Path(path) => path.clone(),
        };
        let coverage = shape_mask(&shape, element.anti_alias, width, height)?;
        let combine: fn(u8, u8) -> u8 = match element.op {
            ClipOp::Intersect => |m, e| mul_div_255(m, e),
            ClipOp::Difference => |m, e| mul_div_255(m, 255 - e),
        };
        for (m, e) in mask.data_mut().iter_mut().zip(coverage.data()) {
            *m = combine(*m, *e);
        }
    }

    Ok(ClipMask::Mask(mask))
}

fn shape_mask(path: &Path, anti_alias: bool, width: u32, height: u32) -> CanvasResult<tiny_skia::Mask> {
    let mut mask = tiny_skia::Mask::new(width, height).ok_or(CanvasError::OutOfMemory)?;
    if let Some(skia_path) = path.to_skia() {
        mask.fill_path(
            &skia_path,
            path.fill_rule().into(),
            anti_alias,
            tiny_skia::Transform::identity(),
        );
    }
    Ok(mask)
}

fn mul_div_255(a: u8, b: u8) -> u8 {
    ((a as u16 * b as u16 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn coverage(mask: &ClipMask, x: u32, y: u32, width: u32) -> u8 {
        match mask {
            ClipMask::Mask(m) => m.data()[(y * width + x) as usize],
            ClipMask::Unclipped => 255,
            ClipMask::Empty => 0,
        }
    }

    #[test]
    fn test_unbounded_and_empty() {
        assert!(matches!(
            clip_mask(&Clip::unbounded(), 4, 4).unwrap(),
            ClipMask::Unclipped
        ));
        let mut clip = Clip::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        clip.intersect_rect(Rect::new(2.0, 2.0, 1.0, 1.0), false);
        assert!(clip_mask(&clip, 4, 4).unwrap().is_empty());
    }

    #[test]
    fn test_rect_with_hole() {
        let mut clip = Clip::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        clip.subtract_rect(Rect::new(4.0, 4.0, 2.0, 2.0), false);
        let mask = clip_mask(&clip, 20, 20).unwrap();
        assert_eq!(coverage(&mask, 1, 1, 20), 255);
        assert_eq!(coverage(&mask, 4, 4, 20), 0);
        assert_eq!(coverage(&mask, 15, 15, 20), 0);
    }

    #[test]
    fn test_mul_div_255() {
        assert_eq!(mul_div_255(255, 255), 255);
        assert_eq!(mul_div_255(255, 0), 0);
        assert_eq!(mul_div_255(128, 255), 128);
    }
}
