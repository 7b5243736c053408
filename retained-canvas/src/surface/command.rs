//! Commands a canvas submits to its surface.
//!
//! Every command is self-contained: it carries the matrix, clip and paint that
//! were live when it was issued, so a surface may execute it later or on
//! another thread without consulting the canvas.

use std::sync::Arc;

use crate::clip::Clip;
use crate::geometry::{ArcParams, Color, Point, Rect, RoundRectParams};
use crate::image::Image;
use crate::matrix::Matrix;
use crate::paint::Paint;
use crate::path::Path;
use crate::style::{BlendMode, PointMode, SrcRectConstraint};

/// Geometry of a draw call in user space.
#[derive(Debug, Clone)]
pub enum Geometry {
    /// Cover the whole clip.
    Fill,
    Rect(Rect),
    RoundRect(RoundRectParams),
    Oval(Rect),
    Arc(ArcParams),
    Path(Path),
    Line {
        from: Point,
        to: Point,
    },
    Points {
        points: Vec<Point>,
        mode: PointMode,
    },
    Image {
        image: Arc<Image>,
        /// Source region in image pixels.
        src: Rect,
        /// Destination in user space.
        dst: Rect,
        constraint: SrcRectConstraint,
    },
    Text {
        text: String,
        /// Aligned anchor the outline was laid out from.
        origin: Point,
        /// Glyph outlines in user space, when a shaper produced them.
        outline: Option<Arc<Path>>,
        /// Layout box in user space.
        bounds: Rect,
    },
}

impl Geometry {
    /// User-space bounds, or `None` for [`Geometry::Fill`] and empty shapes.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Geometry::Fill => None,
            Geometry::Rect(rect) | Geometry::Oval(rect) => Some(*rect),
            Geometry::RoundRect(params) => Some(params.rect),
            Geometry::Arc(params) => Some(params.oval),
            Geometry::Path(path) => path.bounds(),
            Geometry::Line { from, to } => Some(Rect::from_points(*from, *to)),
            Geometry::Points { points, .. } => Rect::bounding(points.iter().copied()),
            Geometry::Image { dst, .. } => Some(*dst),
            Geometry::Text { bounds, .. } => Some(*bounds),
        }
    }

    /// Outline of the shape, for surfaces that only rasterize paths.
    ///
    /// Images, point lists and outline-less text have no single path.
    pub fn to_path(&self) -> Option<Path> {
        let mut path = Path::new();
        match self {
            Geometry::Rect(rect) => path.add_rect(*rect),
            Geometry::RoundRect(params) => path.add_round_rect(params),
            Geometry::Oval(rect) => path.add_oval(*rect),
            Geometry::Arc(params) => path.add_arc(params),
            Geometry::Path(p) => return Some(p.clone()),
            Geometry::Line { from, to } => {
                path.move_to(from.x, from.y);
                path.line_to(to.x, to.y);
            }
            Geometry::Text {
                outline: Some(outline),
                ..
            } => return Some(Path::clone(outline)),
            Geometry::Fill
            | Geometry::Points { .. }
            | Geometry::Image { .. }
            | Geometry::Text { outline: None, .. } => return None,
        }
        Some(path)
    }
}

/// A shape drawn with a paint under a matrix and clip.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub geometry: Geometry,
    /// User space to device space, including the paint's own transform.
    pub matrix: Matrix,
    /// Device-space clip, including the paint's clip rectangle.
    pub clip: Clip,
    pub paint: Paint,
    /// Axis-aligned device bounds of the geometry (stroke included), or
    /// `None` when the draw covers the whole clip.
    pub device_bounds: Option<Rect>,
}

/// Replace pixels with a color, ignoring blending.
#[derive(Debug, Clone)]
pub struct ClearCall {
    pub color: Color,
    /// Device-space area to clear, or `None` for the whole surface.
    pub rect: Option<Rect>,
    pub clip: Clip,
}

/// An offscreen layer opened by `save_layer`.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Device-space extent of the offscreen buffer; `None` for the whole surface.
    pub bounds: Option<Rect>,
    pub opacity: f64,
    pub blend_mode: BlendMode,
    /// Clip used when compositing the layer back onto its parent.
    pub clip: Clip,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Draw(DrawCall),
    Clear(ClearCall),
    /// Direct following commands to a new offscreen buffer.
    BeginLayer(Layer),
    /// Composite the innermost open layer onto its parent.
    EndLayer,
}

impl DrawCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DrawCommand::Draw(_) => "draw",
            DrawCommand::Clear(_) => "clear",
            DrawCommand::BeginLayer(_) => "begin_layer",
            DrawCommand::EndLayer => "end_layer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_bounds() {
        assert_eq!(Geometry::Fill.bounds(), None);
        let line = Geometry::Line {
            from: Point::new(10.0, 0.0),
            to: Point::new(0.0, 5.0),
        };
        assert_eq!(line.bounds(), Some(Rect::new(0.0, 0.0, 10.0, 5.0)));
        let points = Geometry::Points {
            points: vec![],
            mode: PointMode::Points,
        };
        assert_eq!(points.bounds(), None);
    }

    #[test]
    fn test_geometry_to_path() {
        let rect = Geometry::Rect(Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(
            rect.to_path().and_then(|p| p.bounds()),
            Some(Rect::new(0.0, 0.0, 2.0, 2.0))
        );
        assert!(Geometry::Fill.to_path().is_none());
    }
}
