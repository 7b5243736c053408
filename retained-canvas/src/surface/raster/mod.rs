//! Software surface rasterizing into a tiny-skia pixmap.

mod mask;
mod pixmap_cache;
mod shading;

use std::sync::{Mutex, MutexGuard};

use tiny_skia::Pixmap;

use self::mask::{clip_mask, ClipMask};
use self::pixmap_cache::{PixmapCache, DEFAULT_CACHE_BYTES};
use self::shading::{image_pixmap, Shading};
use super::{ClearCall, DrawCall, DrawCommand, Geometry, Layer, Surface, SurfaceType};
use crate::clip::Clip;
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{Color, Point, Rect, Size};
use crate::image::{Image, MAX_IMAGE_DIMENSION};
use crate::matrix::Matrix;
use crate::paint::Paint;
use crate::path::Path;
use crate::style::{LineCap, PaintStyle, PointMode, SrcRectConstraint, TextRenderingMode};

/// An offscreen buffer opened by `BeginLayer`.
struct LayerBuffer {
    pixmap: Pixmap,
    layer: Layer,
}

struct RasterState {
    base: Pixmap,
    layers: Vec<LayerBuffer>,
    cache: PixmapCache,
}

impl RasterState {
    /// The innermost open layer, or the base pixmap.
    fn target(&mut self) -> &mut Pixmap {
        match self.layers.last_mut() {
            Some(buffer) => &mut buffer.pixmap,
            None => &mut self.base,
        }
    }
}

/// A surface that executes commands immediately into an RGBA pixmap.
///
/// Pixels start fully transparent. Layers are rendered into full-size
/// offscreen pixmaps and composited onto their parent on `EndLayer`.
pub struct RasterSurface {
    width: u32,
    height: u32,
    state: Mutex<RasterState>,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl RasterSurface {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        if width == 0 || height == 0 || width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION
        {
            return Err(CanvasError::InvalidParameter(format!(
                "surface size {width}x{height} outside 1..={MAX_IMAGE_DIMENSION}"
            )));
        }
        let base = Pixmap::new(width, height).ok_or(CanvasError::OutOfMemory)?;
        log::debug!(target: "surface", "raster surface {width}x{height}");
        Ok(Self {
            width,
            height,
            state: Mutex::new(RasterState {
                base,
                layers: Vec::new(),
                cache: PixmapCache::new(DEFAULT_CACHE_BYTES),
            }),
        })
    }

    /// Create a surface holding a copy of `image`.
    pub fn from_image(image: &Image) -> CanvasResult<Self> {
        let surface = Self::new(image.width(), image.height())?;
        surface.lock().base = image.to_pixmap()?;
        Ok(surface)
    }

    fn lock(&self) -> MutexGuard<'_, RasterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Open layers not yet composited.
    pub fn layer_depth(&self) -> usize {
        self.lock().layers.len()
    }

    /// Color of one base pixel, not premultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let state = self.lock();
        let px = state.base.pixel(x, y)?.demultiply();
        Some(Color::rgba(px.red(), px.green(), px.blue(), px.alpha()))
    }

    /// Whether `p` lies on a base pixel with any coverage.
    pub fn is_painted(&self, p: Point) -> bool {
        if p.x < 0.0 || p.y < 0.0 {
            return false;
        }
        self.pixel(p.x as u32, p.y as u32).is_some_and(|c| c.a > 0)
    }

    /// Base pixels as straight-alpha RGBA bytes.
    pub fn image_data(&self) -> Vec<u8> {
        let state = self.lock();
        let mut data = Vec::with_capacity(state.base.data().len());
        for px in state.base.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        data
    }

    pub fn to_image(&self) -> CanvasResult<Image> {
        Image::from_rgba(self.image_data(), self.width, self.height)
    }

    /// Encode the base pixels as PNG, tagging the pixel density when `ppi` is given.
    pub fn to_png(&self, ppi: Option<f32>) -> CanvasResult<Vec<u8>> {
        let data = self.image_data();
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            if let Some(ppi) = ppi {
                let ppm = (ppi.max(0.0) / 0.0254).round() as u32;
                encoder.set_pixel_dims(Some(png::PixelDimensions {
                    xppu: ppm,
                    yppu: ppm,
                    unit: png::Unit::Meter,
                }));
            }
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&data)?;
        }
        Ok(buf)
    }

    fn execute(&self, command: DrawCommand) -> CanvasResult<()> {
        let mut state = self.lock();
        match command {
            DrawCommand::Draw(call) => self.draw(&mut state, &call),
            DrawCommand::Clear(call) => self.clear(&mut state, &call),
            DrawCommand::BeginLayer(layer) => {
                let pixmap =
                    Pixmap::new(self.width, self.height).ok_or(CanvasError::OutOfMemory)?;
                state.layers.push(LayerBuffer { pixmap, layer });
                Ok(())
            }
            DrawCommand::EndLayer => {
                let buffer = state.layers.pop().ok_or_else(|| {
                    CanvasError::InvalidOperation("end_layer without an open layer".to_string())
                })?;
                self.composite(&mut state, buffer)
            }
        }
    }

    fn draw(&self, state: &mut RasterState, call: &DrawCall) -> CanvasResult<()> {
        let mask = clip_mask(&call.clip, self.width, self.height)?;
        if mask.is_empty() {
            return Ok(());
        }
        if let Some(filter) = call.paint.filter() {
            log::debug!(target: "surface", "{:?} filter not rasterized", filter.filter_type);
        }

        if let Some(shadow) = call.paint.shadow().filter(|s| s.color.a > 0) {
            let offset = Matrix::translation(shadow.offset.x, shadow.offset.y);
            let shading = Shading::Solid(shadow.color);
            // An image casts the shadow of its destination box.
            let silhouette;
            let geometry = match &call.geometry {
                Geometry::Image { dst, .. } => {
                    silhouette = Geometry::Rect(*dst);
                    &silhouette
                }
                geometry => geometry,
            };
            self.draw_geometry(state, geometry, call, &shading, &(offset * call.matrix), &mask)?;
        }

        let Some(shading) =
            Shading::resolve(&call.paint, &call.matrix, &mut state.cache, (self.width, self.height))
        else {
            log::debug!(target: "surface", "paint source not rasterized");
            return Ok(());
        };
        self.draw_geometry(state, &call.geometry, call, &shading, &call.matrix, &mask)
    }

    fn draw_geometry(
        &self,
        state: &mut RasterState,
        geometry: &Geometry,
        call: &DrawCall,
        shading: &Shading,
        device: &Matrix,
        mask: &ClipMask,
    ) -> CanvasResult<()> {
        let paint = &call.paint;
        let opacity = paint.opacity() as f32;
        let quality = paint.filter_quality().into();

        match geometry {
            Geometry::Fill => {
                let area = match call.clip.bounds() {
                    Some(bounds) => bounds.intersection(&self.bounds()),
                    None => Some(self.bounds()),
                };
                let Some(area) = area else {
                    return Ok(());
                };
                let Some(shader) = shading.shader(opacity, quality) else {
                    return Ok(());
                };
                fill_device_path(
                    state.target(),
                    &Path::from_rect(area),
                    &skia_paint(paint, shader),
                    tiny_skia::FillRule::Winding,
                    mask,
                );
                Ok(())
            }
            Geometry::Image {
                image,
                src,
                dst,
                constraint,
            } => {
                if src.is_empty() || dst.is_empty() {
                    return Ok(());
                }
                let Some(base) = image_pixmap(image, &mut state.cache) else {
                    return Ok(());
                };
                let (pixmap, src) = match constraint {
                    SrcRectConstraint::Strict if *src != image.bounds() => {
                        let crop = src.round_out();
                        let Some(int_rect) = tiny_skia::IntRect::from_xywh(
                            crop.x as i32,
                            crop.y as i32,
                            crop.width as u32,
                            crop.height as u32,
                        ) else {
                            return Ok(());
                        };
                        let Some(cropped) = base.clone_rect(int_rect) else {
                            return Ok(());
                        };
                        (
                            std::sync::Arc::new(cropped),
                            Rect::new(src.x - crop.x, src.y - crop.y, src.width, src.height),
                        )
                    }
                    _ => (base, *src),
                };

                let placement = *device
                    * Matrix::translation(dst.x, dst.y)
                    * Matrix::scaling(dst.width / src.width, dst.height / src.height)
                    * Matrix::translation(-src.x, -src.y);
                let Some(transform) = placement.to_skia() else {
                    log::debug!(target: "surface", "image under a projective matrix skipped");
                    return Ok(());
                };
                let shader = tiny_skia::Pattern::new(
                    Pixmap::as_ref(&pixmap),
                    tiny_skia::SpreadMode::Pad,
                    quality,
                    opacity,
                    transform,
                );
                let device_path = Path::from_rect(*dst).transformed(device)?;
                fill_device_path(
                    state.target(),
                    &device_path,
                    &skia_paint(paint, shader),
                    tiny_skia::FillRule::Winding,
                    mask,
                );
                Ok(())
            }
            Geometry::Points { points, mode } => {
                let Some(shader) = shading.shader(opacity, quality) else {
                    return Ok(());
                };
                let skia = skia_paint(paint, shader);
                let target = state.target();
                match mode {
                    PointMode::Points => {
                        let size = paint.stroke_width().max(1.0);
                        let mut path = Path::new();
                        for p in points {
                            if paint.line_cap() == LineCap::Round {
                                path.add_circle(*p, size / 2.0);
                            } else {
                                path.add_rect(Rect::new(
                                    p.x - size / 2.0,
                                    p.y - size / 2.0,
                                    size,
                                    size,
                                ));
                            }
                        }
                        let device_path = path.transformed(device)?;
                        fill_device_path(
                            target,
                            &device_path,
                            &skia,
                            tiny_skia::FillRule::Winding,
                            mask,
                        );
                    }
                    PointMode::Lines => {
                        let mut path = Path::new();
                        for pair in points.chunks_exact(2) {
                            path.move_to(pair[0].x, pair[0].y);
                            path.line_to(pair[1].x, pair[1].y);
                        }
                        stroke_path(target, &path, device, paint, &skia, mask)?;
                    }
                    PointMode::Polygon => {
                        let mut path = Path::new();
                        path.add_polygon(points, false);
                        stroke_path(target, &path, device, paint, &skia, mask)?;
                    }
                }
                Ok(())
            }
            _ => {
                let Some(path) = geometry.to_path() else {
                    log::trace!(target: "surface", "geometry without outline skipped");
                    return Ok(());
                };
                let (fill, stroke) = match geometry {
                    Geometry::Line { .. } => (false, true),
                    Geometry::Text { .. } => text_passes(paint),
                    _ => (paint.style().fills(), paint.style().strokes()),
                };
                let fill_rule = match geometry {
                    Geometry::Path(p) => p.fill_rule(),
                    _ => paint.fill_rule(),
                };
                let Some(shader) = shading.shader(opacity, quality) else {
                    return Ok(());
                };
                let skia = skia_paint(paint, shader);
                let target = state.target();
                if fill {
                    let device_path = path.transformed(device)?;
                    fill_device_path(target, &device_path, &skia, fill_rule.into(), mask);
                }
                if stroke {
                    stroke_path(target, &path, device, paint, &skia, mask)?;
                }
                Ok(())
            }
        }
    }

    fn clear(&self, state: &mut RasterState, call: &ClearCall) -> CanvasResult<()> {
        let target = state.target();
        if call.rect.is_none() && call.clip.is_unbounded() {
            target.fill(call.color.into());
            return Ok(());
        }
        let mask = clip_mask(&call.clip, self.width, self.height)?;
        if mask.is_empty() {
            return Ok(());
        }
        let area = call.rect.unwrap_or_else(|| self.bounds());
        let Some(rect) = area.to_skia() else {
            return Ok(());
        };
        let paint = tiny_skia::Paint {
            shader: tiny_skia::Shader::SolidColor(call.color.into()),
            blend_mode: tiny_skia::BlendMode::Source,
            anti_alias: false,
            ..Default::default()
        };
        target.fill_rect(rect, &paint, tiny_skia::Transform::identity(), mask.as_ref());
        Ok(())
    }

    fn composite(&self, state: &mut RasterState, buffer: LayerBuffer) -> CanvasResult<()> {
        let LayerBuffer { pixmap, layer } = buffer;
        let mut clip: Clip = layer.clip.clone();
        if let Some(bounds) = layer.bounds {
            clip.intersect_rect(bounds, false);
        }
        let mask = clip_mask(&clip, self.width, self.height)?;
        if mask.is_empty() {
            return Ok(());
        }
        let paint = tiny_skia::PixmapPaint {
            opacity: layer.opacity.clamp(0.0, 1.0) as f32,
            blend_mode: layer.blend_mode.into(),
            quality: tiny_skia::FilterQuality::Nearest,
        };
        state.target().draw_pixmap(
            0,
            0,
            pixmap.as_ref(),
            &paint,
            tiny_skia::Transform::identity(),
            mask.as_ref(),
        );
        log::trace!(target: "surface", "composited layer at opacity {}", layer.opacity);
        Ok(())
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    fn surface_type(&self) -> SurfaceType {
        SurfaceType::Image
    }

    fn submit(&self, command: DrawCommand) -> CanvasResult<()> {
        log::trace!(target: "surface", "execute {}", command.name());
        self.execute(command)
    }

    /// Releases cached pixmaps. Open layers stay open until their
    /// `EndLayer` arrives.
    fn finish(&self) -> CanvasResult<()> {
        let mut state = self.lock();
        if !state.layers.is_empty() {
            log::debug!(
                target: "surface",
                "finish with {} open layer(s)",
                state.layers.len()
            );
        }
        state.cache.clear();
        Ok(())
    }

    fn snapshot(&self) -> Option<Image> {
        Image::from_pixmap(&self.lock().base).ok()
    }
}

/// Glyph passes for text: an explicit rendering mode wins over the paint style.
fn text_passes(paint: &Paint) -> (bool, bool) {
    match paint.text().rendering_mode {
        TextRenderingMode::Fill => match paint.style() {
            PaintStyle::Fill => (true, false),
            style => (style.fills(), style.strokes()),
        },
        mode => (mode.fills(), mode.strokes()),
    }
}

fn skia_paint<'a>(paint: &Paint, shader: tiny_skia::Shader<'a>) -> tiny_skia::Paint<'a> {
    tiny_skia::Paint {
        shader,
        anti_alias: paint.antialias().is_enabled(),
        blend_mode: paint.blend_mode().into(),
        ..Default::default()
    }
}

fn fill_device_path(
    target: &mut Pixmap,
    device_path: &Path,
    paint: &tiny_skia::Paint,
    fill_rule: tiny_skia::FillRule,
    mask: &ClipMask,
) {
    if let Some(path) = device_path.to_skia() {
        target.fill_path(
            &path,
            paint,
            fill_rule,
            tiny_skia::Transform::identity(),
            mask.as_ref(),
        );
    }
}

/// Stroke `path` in device space.
///
/// Line width and dashes scale by the average axis scale of `device`, so
/// a non-uniform scale yields a uniform-width stroke.
fn stroke_path(
    target: &mut Pixmap,
    path: &Path,
    device: &Matrix,
    paint: &Paint,
    skia: &tiny_skia::Paint,
    mask: &ClipMask,
) -> CanvasResult<()> {
    let Some(device_path) = path.transformed(device)?.to_skia() else {
        return Ok(());
    };
    let scale = ((device.scale_x() + device.scale_y()) / 2.0) as f32;
    let stroke = tiny_skia::Stroke {
        width: paint.stroke_width() as f32 * scale,
        miter_limit: paint.miter_limit() as f32,
        line_cap: paint.line_cap().into(),
        line_join: paint.line_join().into(),
        dash: paint.dash().and_then(|dash| {
            let intervals = dash
                .intervals
                .iter()
                .map(|d| *d as f32 * scale)
                .collect();
            tiny_skia::StrokeDash::new(intervals, dash.offset as f32 * scale)
        }),
    };
    target.stroke_path(
        &device_path,
        skia,
        &stroke,
        tiny_skia::Transform::identity(),
        mask.as_ref(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RoundRectParams;
    use crate::gradient::Gradient;
    use crate::paint::Shadow;
    use crate::style::BlendMode;
    use std::sync::Arc;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn draw(geometry: Geometry, matrix: Matrix, clip: Clip, paint: Paint) -> DrawCommand {
        DrawCommand::Draw(DrawCall {
            device_bounds: geometry.bounds().and_then(|b| matrix.map_rect(&b).ok()),
            geometry,
            matrix,
            clip,
            paint,
        })
    }

    fn fill_rect(surface: &RasterSurface, rect: Rect, color: Color) {
        surface
            .submit(draw(
                Geometry::Rect(rect),
                Matrix::IDENTITY,
                Clip::unbounded(),
                Paint::fill(color),
            ))
            .unwrap();
    }

    #[test]
    fn test_invalid_size() {
        assert!(RasterSurface::new(0, 10).is_err());
        assert!(RasterSurface::new(10, MAX_IMAGE_DIMENSION + 1).is_err());
    }

    #[test]
    fn test_starts_transparent() {
        let surface = RasterSurface::new(4, 4).unwrap();
        assert_eq!(surface.pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn test_fill_rect_under_matrix() {
        let surface = RasterSurface::new(40, 40).unwrap();
        let matrix = Matrix::translation(10.0, 10.0) * Matrix::scaling(2.0, 2.0);
        surface
            .submit(draw(
                Geometry::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
                matrix,
                Clip::unbounded(),
                Paint::fill(RED),
            ))
            .unwrap();
        assert_eq!(surface.pixel(15, 15), Some(RED));
        assert_eq!(surface.pixel(29, 29), Some(RED));
        assert_eq!(surface.pixel(5, 5), Some(Color::TRANSPARENT));
        assert_eq!(surface.pixel(31, 31), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_clip_restricts_fill() {
        let surface = RasterSurface::new(20, 20).unwrap();
        surface
            .submit(draw(
                Geometry::Fill,
                Matrix::IDENTITY,
                Clip::from_rect(Rect::new(5.0, 5.0, 5.0, 5.0)),
                Paint::fill(BLUE),
            ))
            .unwrap();
        assert_eq!(surface.pixel(7, 7), Some(BLUE));
        assert_eq!(surface.pixel(2, 2), Some(Color::TRANSPARENT));
        assert_eq!(surface.pixel(12, 12), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_clip_out_leaves_hole() {
        let surface = RasterSurface::new(20, 20).unwrap();
        let mut clip = Clip::from_rect(Rect::new(0.0, 0.0, 20.0, 20.0));
        clip.subtract_rect(Rect::new(5.0, 5.0, 10.0, 10.0), false);
        surface
            .submit(draw(Geometry::Fill, Matrix::IDENTITY, clip, Paint::fill(RED)))
            .unwrap();
        assert_eq!(surface.pixel(2, 2), Some(RED));
        assert_eq!(surface.pixel(10, 10), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_stroke_only_paints_outline() {
        let surface = RasterSurface::new(30, 30).unwrap();
        let mut paint = Paint::stroke(RED, 2.0);
        paint.set_antialias(crate::style::AntialiasMode::None);
        surface
            .submit(draw(
                Geometry::Rect(Rect::new(5.0, 5.0, 20.0, 20.0)),
                Matrix::IDENTITY,
                Clip::unbounded(),
                paint,
            ))
            .unwrap();
        assert_eq!(surface.pixel(5, 15), Some(RED));
        assert_eq!(surface.pixel(15, 15), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_clear_rect_replaces_pixels() {
        let surface = RasterSurface::new(10, 10).unwrap();
        fill_rect(&surface, Rect::new(0.0, 0.0, 10.0, 10.0), RED);
        surface
            .submit(DrawCommand::Clear(ClearCall {
                color: Color::TRANSPARENT,
                rect: Some(Rect::new(0.0, 0.0, 5.0, 10.0)),
                clip: Clip::unbounded(),
            }))
            .unwrap();
        assert_eq!(surface.pixel(2, 2), Some(Color::TRANSPARENT));
        assert_eq!(surface.pixel(7, 2), Some(RED));
    }

    #[test]
    fn test_layer_composites_with_opacity() {
        let surface = RasterSurface::new(10, 10).unwrap();
        fill_rect(&surface, Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        surface
            .submit(DrawCommand::BeginLayer(Layer {
                bounds: None,
                opacity: 0.5,
                blend_mode: BlendMode::Normal,
                clip: Clip::unbounded(),
            }))
            .unwrap();
        fill_rect(&surface, Rect::new(0.0, 0.0, 10.0, 10.0), BLUE);
        assert_eq!(surface.layer_depth(), 1);
        // Base untouched until the layer ends.
        assert_eq!(surface.pixel(5, 5), Some(Color::WHITE));

        surface.submit(DrawCommand::EndLayer).unwrap();
        assert_eq!(surface.layer_depth(), 0);
        let px = surface.pixel(5, 5).unwrap();
        assert!((120..=135).contains(&px.r), "{px:?}");
        assert_eq!(px.b, 255);
    }

    #[test]
    fn test_end_layer_without_begin() {
        let surface = RasterSurface::new(4, 4).unwrap();
        assert!(matches!(
            surface.submit(DrawCommand::EndLayer),
            Err(CanvasError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_finish_keeps_open_layers() {
        let surface = RasterSurface::new(4, 4).unwrap();
        surface
            .submit(DrawCommand::BeginLayer(Layer {
                bounds: Some(Rect::new(0.0, 0.0, 2.0, 4.0)),
                opacity: 1.0,
                blend_mode: BlendMode::Normal,
                clip: Clip::unbounded(),
            }))
            .unwrap();
        fill_rect(&surface, Rect::new(0.0, 0.0, 4.0, 4.0), RED);
        surface.finish().unwrap();
        assert_eq!(surface.layer_depth(), 1);
        assert_eq!(surface.pixel(1, 1), Some(Color::TRANSPARENT));

        surface.submit(DrawCommand::EndLayer).unwrap();
        assert_eq!(surface.layer_depth(), 0);
        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(3, 1), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_gradient_fill() {
        let surface = RasterSurface::new(100, 10).unwrap();
        let mut gradient = Gradient::new_linear(Point::ZERO, Point::new(100.0, 0.0));
        gradient.add_color_stop(0.0, RED).unwrap();
        gradient.add_color_stop(1.0, BLUE).unwrap();
        let mut paint = Paint::new();
        paint.set_gradient(Arc::new(gradient));
        surface
            .submit(draw(Geometry::Fill, Matrix::IDENTITY, Clip::unbounded(), paint))
            .unwrap();
        let left = surface.pixel(1, 5).unwrap();
        let right = surface.pixel(98, 5).unwrap();
        assert!(left.r > 240 && left.b < 15, "{left:?}");
        assert!(right.b > 240 && right.r < 15, "{right:?}");
    }

    #[test]
    fn test_draw_image_scaled() {
        let surface = RasterSurface::new(20, 20).unwrap();
        let image = Arc::new(Image::filled(2, 2, BLUE).unwrap());
        surface
            .submit(draw(
                Geometry::Image {
                    src: image.bounds(),
                    image,
                    dst: Rect::new(0.0, 0.0, 10.0, 10.0),
                    constraint: SrcRectConstraint::Strict,
                },
                Matrix::IDENTITY,
                Clip::unbounded(),
                Paint::new(),
            ))
            .unwrap();
        assert_eq!(surface.pixel(5, 5), Some(BLUE));
        assert_eq!(surface.pixel(15, 15), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_shadow_drawn_offset() {
        let surface = RasterSurface::new(30, 30).unwrap();
        let mut paint = Paint::fill(RED);
        paint.set_shadow(Some(Shadow {
            color: BLUE,
            offset: Point::new(10.0, 10.0),
            blur: 0.0,
        }));
        surface
            .submit(draw(
                Geometry::RoundRect(RoundRectParams {
                    rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                    radius_x: 0.0,
                    radius_y: 0.0,
                }),
                Matrix::IDENTITY,
                Clip::unbounded(),
                paint,
            ))
            .unwrap();
        assert_eq!(surface.pixel(5, 5), Some(RED));
        assert_eq!(surface.pixel(15, 15), Some(BLUE));
    }

    #[test]
    fn test_points_mode() {
        let surface = RasterSurface::new(10, 10).unwrap();
        let mut paint = Paint::fill(RED);
        paint.set_stroke_width(2.0);
        surface
            .submit(draw(
                Geometry::Points {
                    points: vec![Point::new(2.0, 2.0), Point::new(7.0, 7.0)],
                    mode: PointMode::Points,
                },
                Matrix::IDENTITY,
                Clip::unbounded(),
                paint,
            ))
            .unwrap();
        assert!(surface.is_painted(Point::new(2.0, 2.0)));
        assert!(surface.is_painted(Point::new(7.0, 7.0)));
        assert!(!surface.is_painted(Point::new(5.0, 2.0)));
    }

    #[test]
    fn test_png_and_snapshot() {
        let surface = RasterSurface::new(3, 2).unwrap();
        fill_rect(&surface, Rect::new(0.0, 0.0, 3.0, 2.0), RED);
        let png = surface.to_png(Some(144.0)).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let snapshot = surface.snapshot().unwrap();
        assert_eq!((snapshot.width(), snapshot.height()), (3, 2));
        assert_eq!(snapshot.pixel(2, 1), Some(RED));
    }

    #[test]
    fn test_from_image() {
        let image = Image::filled(2, 2, BLUE).unwrap();
        let surface = RasterSurface::from_image(&image).unwrap();
        assert_eq!(surface.pixel(1, 1), Some(BLUE));
    }
}
