//! Draw operations for Canvas.
//!
//! Every draw funnels through [`Canvas::dispatch`], which composes the live
//! matrix and clip with the paint's own transform and clip rectangle and
//! submits one self-contained [`DrawCall`].

use std::sync::Arc;

use super::Canvas;
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{ArcParams, Color, ImageRectParams, Point, Rect, RoundRectParams};
use crate::gradient::Gradient;
use crate::image::Image;
use crate::matrix::Matrix;
use crate::paint::{Paint, PaintSource};
use crate::path::{Path, PathMeasure};
use crate::pattern::Pattern;
use crate::shader::Shader;
use crate::style::{LineJoin, PaintStyle, PointMode, SrcRectConstraint, TextAlign, TextBaseline};
use crate::surface::{ClearCall, DrawCall, DrawCommand, Geometry};
use crate::text::TextBlob;

impl Canvas {
    /// Compose state with `geometry` and `paint` and hand the result to the
    /// surface. Without a surface this only validates the geometry.
    pub(super) fn dispatch(&mut self, geometry: Geometry, paint: &Paint) -> CanvasResult<()> {
        ensure_finite(&geometry)?;
        let Some(surface) = self.surface.clone() else {
            log::debug!(target: "canvas", "no surface bound, skipping draw");
            return Ok(());
        };

        let mut clip = self.state.clip.clone();
        if let Some(rect) = paint.clip_rect() {
            match self.device_rect(rect)? {
                Ok(rect) => clip.intersect_rect(rect, false),
                Err(path) => clip.intersect_path(path, false),
            }
        }
        if clip.is_empty() {
            log::debug!(target: "canvas", "clip is empty, skipping draw");
            return Ok(());
        }

        let matrix = self.state.matrix * paint.transform();
        let device_bounds = device_bounds(&geometry, &matrix, paint);
        let call = DrawCall {
            geometry,
            matrix,
            clip,
            paint: paint.clone(),
            device_bounds,
        };
        self.submit(surface.as_ref(), DrawCommand::Draw(call))?;
        self.mark_dirty(device_bounds);
        Ok(())
    }

    /// The live paint with its style replaced.
    fn styled_paint(&self, style: PaintStyle) -> Paint {
        self.state.paint.clone().with_style(style)
    }

    // --- Whole-clip fills ---

    /// Fill the clip with `color`, blending normally.
    pub fn draw_color(&mut self, color: Color) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_color {:?}", color);
        self.dispatch(Geometry::Fill, &Paint::fill(color))
    }

    /// Fill the clip with `paint`.
    pub fn draw_paint(&mut self, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_paint");
        self.dispatch(Geometry::Fill, paint)
    }

    /// Fill the clip with a gradient, using the live paint otherwise.
    pub fn draw_gradient(&mut self, gradient: Arc<Gradient>) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_gradient");
        let paint = self
            .styled_paint(PaintStyle::Fill)
            .with_source(PaintSource::Gradient(gradient));
        self.dispatch(Geometry::Fill, &paint)
    }

    /// Fill the clip with a pattern, using the live paint otherwise.
    pub fn draw_pattern(&mut self, pattern: Arc<Pattern>) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_pattern");
        let paint = self
            .styled_paint(PaintStyle::Fill)
            .with_source(PaintSource::Pattern(pattern));
        self.dispatch(Geometry::Fill, &paint)
    }

    /// Fill the clip with a shader, using the live paint otherwise.
    pub fn draw_shader(&mut self, shader: Arc<Shader>) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_shader");
        let paint = self
            .styled_paint(PaintStyle::Fill)
            .with_source(PaintSource::Shader(shader));
        self.dispatch(Geometry::Fill, &paint)
    }

    // --- Shapes ---

    pub fn draw_rect(&mut self, rect: Rect, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_rect {:?}", rect);
        self.dispatch(Geometry::Rect(rect), paint)
    }

    pub fn draw_round_rect(
        &mut self,
        rect: Rect,
        radius_x: f64,
        radius_y: f64,
        paint: &Paint,
    ) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_round_rect {:?} {} {}", rect, radius_x, radius_y);
        if radius_x < 0.0 || radius_y < 0.0 {
            return Err(CanvasError::InvalidParameter(format!(
                "negative corner radius ({radius_x}, {radius_y})"
            )));
        }
        let params = RoundRectParams {
            rect,
            radius_x,
            radius_y,
        };
        self.dispatch(Geometry::RoundRect(params), paint)
    }

    pub fn draw_circle(&mut self, center: Point, radius: f64, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_circle {:?} {}", center, radius);
        if radius < 0.0 {
            return Err(CanvasError::InvalidParameter(format!(
                "negative radius {radius}"
            )));
        }
        let oval = Rect::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        );
        self.dispatch(Geometry::Oval(oval), paint)
    }

    pub fn draw_oval(&mut self, oval: Rect, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_oval {:?}", oval);
        self.dispatch(Geometry::Oval(oval), paint)
    }

    pub fn draw_arc(&mut self, params: &ArcParams, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_arc {:?}", params);
        if !params.start_angle.is_finite() || !params.sweep_angle.is_finite() {
            return Err(CanvasError::InvalidParameter(
                "non-finite arc angle".to_string(),
            ));
        }
        self.dispatch(Geometry::Arc(*params), paint)
    }

    pub fn draw_path(&mut self, path: &Path, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_path");
        if path.is_empty() {
            return Ok(());
        }
        self.dispatch(Geometry::Path(path.clone()), paint)
    }

    /// Stroke a segment. Lines have no interior, so the paint style is ignored.
    pub fn draw_line(&mut self, from: Point, to: Point, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_line {:?} {:?}", from, to);
        self.dispatch(Geometry::Line { from, to }, paint)
    }

    /// A single point, drawn as a dot of the stroke width.
    pub fn draw_point(&mut self, point: Point, paint: &Paint) -> CanvasResult<()> {
        self.draw_points(PointMode::Points, &[point], paint)
    }

    /// Draw `points` as dots, separate segments (pairs) or one open polyline.
    pub fn draw_points(
        &mut self,
        mode: PointMode,
        points: &[Point],
        paint: &Paint,
    ) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_points {:?} x{}", mode, points.len());
        if points.is_empty() {
            return Ok(());
        }
        let geometry = Geometry::Points {
            points: points.to_vec(),
            mode,
        };
        self.dispatch(geometry, paint)
    }

    // --- Images ---

    /// Draw the whole image scaled into `dst`.
    pub fn draw_image(&mut self, image: &Arc<Image>, dst: Rect, paint: &Paint) -> CanvasResult<()> {
        let params = ImageRectParams {
            src: image.bounds(),
            dst,
        };
        self.draw_image_rect(image, &params, SrcRectConstraint::Strict, paint)
    }

    /// Draw the image unscaled with its top-left corner at `origin`.
    pub fn draw_image_at(
        &mut self,
        image: &Arc<Image>,
        origin: Point,
        paint: &Paint,
    ) -> CanvasResult<()> {
        let dst = Rect::new(
            origin.x,
            origin.y,
            image.width() as f64,
            image.height() as f64,
        );
        self.draw_image(image, dst, paint)
    }

    /// Draw the `src` part of the image (in image pixels) scaled into `dst`.
    ///
    /// `src` is clipped to the image. With [`SrcRectConstraint::Strict`] no
    /// pixel outside `src` is sampled; `Fast` allows filtering to read
    /// neighbouring pixels.
    pub fn draw_image_rect(
        &mut self,
        image: &Arc<Image>,
        params: &ImageRectParams,
        constraint: SrcRectConstraint,
        paint: &Paint,
    ) -> CanvasResult<()> {
        log::debug!(
            target: "canvas",
            "draw_image_rect {}x{} {:?} -> {:?}",
            image.width(),
            image.height(),
            params.src,
            params.dst
        );
        if !params.src.is_finite() || !params.dst.is_finite() {
            return Err(CanvasError::InvalidParameter(
                "non-finite image rectangle".to_string(),
            ));
        }
        let Some(src) = params
            .src
            .intersection(&image.bounds())
            .filter(|r| !r.is_empty())
        else {
            log::debug!(target: "canvas", "image source rect outside the image");
            return Ok(());
        };
        if params.dst.is_empty() {
            return Ok(());
        }
        let geometry = Geometry::Image {
            image: Arc::clone(image),
            src,
            dst: params.dst,
            constraint,
        };
        self.dispatch(geometry, paint)
    }

    /// Draw a snapshot of another canvas's surface with its top-left corner
    /// at `origin`. Nothing is drawn when that surface holds no pixels.
    pub fn draw_canvas(&mut self, other: &Canvas, origin: Point, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_canvas at {:?}", origin);
        let Some(image) = other.surface.as_ref().and_then(|s| s.snapshot()) else {
            log::debug!(target: "canvas", "source canvas has no readable surface");
            return Ok(());
        };
        self.draw_image_at(&Arc::new(image), origin, paint)
    }

    // --- Text ---

    /// Shape and draw `text` anchored at `origin` by the paint's text
    /// alignment and baseline.
    pub fn draw_text(&mut self, text: &str, origin: Point, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_text {:?} at {:?}", text, origin);
        if text.is_empty() {
            return Ok(());
        }
        let style = paint.text();
        let blob = self.shaper.shape(text, style);
        let anchor = blob.metrics().anchor_offset(style.align, style.baseline);
        let start = Point::new(origin.x + anchor.x, origin.y + anchor.y);
        self.dispatch_blob(&blob, start, paint)
    }

    /// Draw `text` aligned inside `rect` and clipped to it.
    ///
    /// Horizontal placement follows the text alignment; `Top`, `Middle` and
    /// `Bottom` baselines align to the matching edge or center and the others
    /// put the top of the first line at the top of `rect`.
    pub fn draw_text_in(&mut self, text: &str, rect: Rect, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_text_in {:?} {:?}", text, rect);
        if text.is_empty() || rect.is_empty() {
            return Ok(());
        }
        let style = paint.text();
        let blob = self.shaper.shape(text, style);
        let metrics = blob.metrics();
        let x = match style.align {
            TextAlign::Left | TextAlign::Justify => rect.left(),
            TextAlign::Center => rect.center().x,
            TextAlign::Right => rect.right(),
        };
        let (y, baseline) = match style.baseline {
            TextBaseline::Top => (rect.top(), TextBaseline::Top),
            TextBaseline::Middle => (rect.center().y, TextBaseline::Middle),
            TextBaseline::Bottom => (rect.bottom(), TextBaseline::Bottom),
            TextBaseline::Alphabetic | TextBaseline::Ideographic => {
                (rect.top(), TextBaseline::Top)
            }
        };
        let anchor = metrics.anchor_offset(style.align, baseline);
        let start = Point::new(x + anchor.x, y + anchor.y);

        let clip = match paint.clip_rect() {
            Some(existing) => match existing.intersection(&rect) {
                Some(clip) => clip,
                None => return Ok(()),
            },
            None => rect,
        };
        let mut bounded = paint.clone();
        bounded.set_clip_rect(Some(clip));
        self.dispatch_blob(&blob, start, &bounded)
    }

    /// Draw pre-shaped text with its first baseline starting at `origin`.
    pub fn draw_text_blob(&mut self, blob: &TextBlob, origin: Point, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "draw_text_blob {:?} at {:?}", blob.text, origin);
        if blob.is_empty() {
            return Ok(());
        }
        self.dispatch_blob(blob, origin, paint)
    }

    /// Draw `text` along the first contour of `path`.
    ///
    /// Characters are shaped one at a time. Each is centered on the path at
    /// `h_offset` plus the advance so far and turned to the tangent there;
    /// `v_offset` moves it along the glyph's own y axis, so positive values
    /// sit below a left-to-right path. Characters whose center falls before
    /// the start are skipped and drawing stops at the end of the contour.
    /// Alignment and baseline do not apply.
    pub fn draw_text_on_path(
        &mut self,
        text: &str,
        path: &Path,
        h_offset: f64,
        v_offset: f64,
        paint: &Paint,
    ) -> CanvasResult<()> {
        log::debug!(
            target: "canvas",
            "draw_text_on_path {:?} offset ({}, {})", text, h_offset, v_offset
        );
        if !h_offset.is_finite() || !v_offset.is_finite() {
            return Err(CanvasError::InvalidParameter(
                "non-finite text offset".to_string(),
            ));
        }
        if text.is_empty() || path.is_empty() {
            return Ok(());
        }

        let measure = PathMeasure::new(path);
        let style = paint.text();
        let mut outline = Path::new();
        let mut bounds: Option<Rect> = None;
        let mut placed = String::new();
        let mut advance = h_offset;
        let mut buf = [0u8; 4];
        for ch in text.chars().filter(|c| !c.is_control()) {
            let glyph = self.shaper.shape(ch.encode_utf8(&mut buf), style);
            let width = glyph.bounds.width;
            let center = advance + width / 2.0;
            advance += width;
            if center > measure.length() {
                break;
            }
            let Some((at, angle)) = measure.position_and_tangent(center) else {
                continue;
            };
            let placement = Matrix::translation(at.x, at.y)
                * Matrix::rotation(angle)
                * Matrix::translation(-width / 2.0, v_offset);
            if let Some(glyph_outline) = &glyph.outline {
                outline.add_path(&glyph_outline.transformed(&placement)?);
            }
            let glyph_box = placement.map_rect(&glyph.bounds)?;
            bounds = Some(bounds.map_or(glyph_box, |b| b.union(&glyph_box)));
            placed.push(ch);
        }

        let Some(bounds) = bounds else {
            log::debug!(target: "canvas", "no characters fit on the path");
            return Ok(());
        };
        let geometry = Geometry::Text {
            text: placed,
            origin: bounds.origin(),
            outline: (!outline.is_empty()).then(|| Arc::new(outline)),
            bounds,
        };
        self.dispatch(geometry, paint)
    }

    fn dispatch_blob(&mut self, blob: &TextBlob, start: Point, paint: &Paint) -> CanvasResult<()> {
        let placement = Matrix::translation(start.x, start.y);
        let outline = match &blob.outline {
            Some(outline) => Some(Arc::new(outline.transformed(&placement)?)),
            None => None,
        };
        let geometry = Geometry::Text {
            text: blob.text.clone(),
            origin: start,
            outline,
            bounds: blob.bounds.translate(start.x, start.y),
        };
        self.dispatch(geometry, paint)
    }

    // --- Clearing ---

    /// Replace every pixel inside the clip with `color`, ignoring blending.
    pub fn clear(&mut self, color: Color) -> CanvasResult<()> {
        log::debug!(target: "canvas", "clear {:?}", color);
        let call = ClearCall {
            color,
            rect: None,
            clip: self.state.clip.clone(),
        };
        self.dispatch_clear(call, None)
    }

    /// Replace the pixels of a user-space rectangle (inside the clip) with
    /// `color`.
    pub fn clear_rect(&mut self, rect: Rect, color: Color) -> CanvasResult<()> {
        log::debug!(target: "canvas", "clear_rect {:?} {:?}", rect, color);
        let mut clip = self.state.clip.clone();
        let area = match self.device_rect(rect)? {
            Ok(device) => device,
            Err(path) => {
                let bounds = path.bounds();
                clip.intersect_path(path, false);
                match bounds {
                    Some(bounds) => bounds,
                    None => return Ok(()),
                }
            }
        };
        let call = ClearCall {
            color,
            rect: Some(area),
            clip,
        };
        self.dispatch_clear(call, Some(area))
    }

    fn dispatch_clear(&mut self, call: ClearCall, area: Option<Rect>) -> CanvasResult<()> {
        let Some(surface) = self.surface.clone() else {
            return Ok(());
        };
        if call.clip.is_empty() {
            return Ok(());
        }
        self.submit(surface.as_ref(), DrawCommand::Clear(call))?;
        self.mark_dirty(area);
        Ok(())
    }

    // --- Convenience forms using the live paint ---

    pub fn fill_rect(&mut self, rect: Rect) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Fill);
        self.draw_rect(rect, &paint)
    }

    pub fn stroke_rect(&mut self, rect: Rect) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Stroke);
        self.draw_rect(rect, &paint)
    }

    pub fn fill_path(&mut self, path: &Path) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Fill);
        self.draw_path(path, &paint)
    }

    pub fn stroke_path(&mut self, path: &Path) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Stroke);
        self.draw_path(path, &paint)
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Fill);
        self.draw_circle(center, radius, &paint)
    }

    pub fn stroke_circle(&mut self, center: Point, radius: f64) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Stroke);
        self.draw_circle(center, radius, &paint)
    }

    pub fn fill_round_rect(&mut self, rect: Rect, radius_x: f64, radius_y: f64) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Fill);
        self.draw_round_rect(rect, radius_x, radius_y, &paint)
    }

    pub fn stroke_round_rect(
        &mut self,
        rect: Rect,
        radius_x: f64,
        radius_y: f64,
    ) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Stroke);
        self.draw_round_rect(rect, radius_x, radius_y, &paint)
    }

    pub fn fill_oval(&mut self, oval: Rect) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Fill);
        self.draw_oval(oval, &paint)
    }

    pub fn stroke_oval(&mut self, oval: Rect) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Stroke);
        self.draw_oval(oval, &paint)
    }

    pub fn fill_arc(&mut self, params: &ArcParams) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Fill);
        self.draw_arc(params, &paint)
    }

    pub fn stroke_arc(&mut self, params: &ArcParams) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Stroke);
        self.draw_arc(params, &paint)
    }

    pub fn stroke_line(&mut self, from: Point, to: Point) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Stroke);
        self.draw_line(from, to, &paint)
    }

    pub fn fill_text(&mut self, text: &str, origin: Point) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Fill);
        self.draw_text(text, origin, &paint)
    }

    pub fn stroke_text(&mut self, text: &str, origin: Point) -> CanvasResult<()> {
        let paint = self.styled_paint(PaintStyle::Stroke);
        self.draw_text(text, origin, &paint)
    }
}

fn ensure_finite(geometry: &Geometry) -> CanvasResult<()> {
    let finite = match geometry {
        Geometry::Points { points, .. } => points.iter().all(Point::is_finite),
        Geometry::Text { origin, .. } => origin.is_finite(),
        other => other.bounds().map_or(true, |b| b.is_finite()),
    };
    if finite {
        Ok(())
    } else {
        Err(CanvasError::InvalidParameter(
            "geometry has non-finite coordinates".to_string(),
        ))
    }
}

/// Half the stroke footprint, widened for miter joins.
fn stroke_outset(paint: &Paint) -> f64 {
    let half = paint.stroke_width().max(1.0) / 2.0;
    match paint.line_join() {
        LineJoin::Miter => half * paint.miter_limit().max(1.0),
        _ => half,
    }
}

/// Axis-aligned device bounds of what `geometry` may touch, including the
/// stroke and the shadow.
fn device_bounds(geometry: &Geometry, matrix: &Matrix, paint: &Paint) -> Option<Rect> {
    let bounds = geometry.bounds()?;
    let strokes = match geometry {
        Geometry::Line { .. } | Geometry::Points { .. } => true,
        Geometry::Text { .. } => {
            paint.style().strokes() || paint.text().rendering_mode.strokes()
        }
        Geometry::Image { .. } => false,
        _ => paint.style().strokes(),
    };
    let outset = if strokes { stroke_outset(paint) } else { 0.0 };
    let mut device = matrix.map_rect(&bounds.outset(outset, outset)).ok()?;
    if let Some(shadow) = paint.shadow() {
        let cast = device
            .translate(shadow.offset.x, shadow.offset.y)
            .outset(shadow.blur, shadow.blur);
        device = device.union(&cast);
    }
    Some(device)
}
