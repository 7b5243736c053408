//! Paint sources resolved into tiny-skia shaders.

use std::sync::Arc;

use tiny_skia::Pixmap;

use super::pixmap_cache::{tile_offset, tile_pixmap, PixmapCache, PixmapKey};
use crate::geometry::Color;
use crate::gradient::{Gradient, GradientType};
use crate::image::Image;
use crate::matrix::Matrix;
use crate::paint::{ActiveSource, Paint};
use crate::pattern::{Pattern, Repetition};
use crate::shader::ShaderKind;

/// A paint's color source with every shared resource resolved.
///
/// Holds the pixmaps a pattern shader borrows, so the shader can be created
/// for the lifetime of a single draw.
pub(super) enum Shading {
    Solid(Color),
    Gradient {
        gradient: Arc<Gradient>,
        transform: tiny_skia::Transform,
    },
    Pixmap {
        pixmap: Arc<Pixmap>,
        spread: tiny_skia::SpreadMode,
        transform: tiny_skia::Transform,
    },
}

impl Shading {
    /// Resolve the source of `paint` for a draw whose user space maps to
    /// device space through `device`.
    ///
    /// Returns `None` when the source cannot be rasterized, such as under a
    /// projective matrix or when a pixmap cannot be allocated.
    pub(super) fn resolve(
        paint: &Paint,
        device: &Matrix,
        cache: &mut PixmapCache,
        surface_size: (u32, u32),
    ) -> Option<Shading> {
        match paint.active_source() {
            ActiveSource::Color(color) => Some(Shading::Solid(color)),
            ActiveSource::Gradient(gradient) => gradient_shading(gradient, device),
            ActiveSource::Pattern(pattern) => {
                pattern_shading(pattern, device, cache, surface_size)
            }
            ActiveSource::Image(image) => {
                let pattern = Pattern::new(Arc::clone(image), Repetition::NoRepeat);
                pattern_shading(&pattern, device, cache, surface_size)
            }
            ActiveSource::Shader(shader) => {
                let local = *device * shader.local_matrix;
                match &shader.kind {
                    ShaderKind::Solid(color) => Some(Shading::Solid(*color)),
                    ShaderKind::Gradient(gradient) => gradient_shading(gradient, &local),
                    ShaderKind::Pattern(pattern) => {
                        pattern_shading(pattern, &local, cache, surface_size)
                    }
                }
            }
        }
    }

    /// The tiny-skia shader, with `opacity` folded into its alpha.
    pub(super) fn shader(
        &self,
        opacity: f32,
        quality: tiny_skia::FilterQuality,
    ) -> Option<tiny_skia::Shader<'_>> {
        match self {
            Shading::Solid(color) => Some(tiny_skia::Shader::SolidColor(with_opacity(
                *color, opacity,
            ))),
            Shading::Gradient {
                gradient,
                transform,
            } => {
                let stops: Vec<tiny_skia::GradientStop> = gradient
                    .stops()
                    .iter()
                    .map(|stop| {
                        tiny_skia::GradientStop::new(
                            stop.offset as f32,
                            with_opacity(stop.color, opacity),
                        )
                    })
                    .collect();
                if stops.is_empty() {
                    return None;
                }
                let spread = gradient.spread.into();
                match gradient.gradient_type {
                    GradientType::Linear { start, end } => tiny_skia::LinearGradient::new(
                        skia_point(start.x, start.y),
                        skia_point(end.x, end.y),
                        stops,
                        spread,
                        *transform,
                    ),
                    GradientType::Radial {
                        focal,
                        center,
                        radius,
                    } => tiny_skia::RadialGradient::new(
                        skia_point(focal.x, focal.y),
                        skia_point(center.x, center.y),
                        radius as f32,
                        stops,
                        spread,
                        *transform,
                    ),
                }
            }
            Shading::Pixmap {
                pixmap,
                spread,
                transform,
            } => Some(tiny_skia::Pattern::new(
                Pixmap::as_ref(pixmap),
                *spread,
                quality,
                opacity,
                *transform,
            )),
        }
    }
}

fn gradient_shading(gradient: &Arc<Gradient>, device: &Matrix) -> Option<Shading> {
    let Some(transform) = device.to_skia() else {
        log::debug!(target: "surface", "gradient under a projective matrix skipped");
        return None;
    };
    Some(Shading::Gradient {
        gradient: Arc::clone(gradient),
        transform,
    })
}

fn pattern_shading(
    pattern: &Pattern,
    device: &Matrix,
    cache: &mut PixmapCache,
    (width, height): (u32, u32),
) -> Option<Shading> {
    let image = pattern.image();
    let repetition = pattern.repetition();
    let base = image_pixmap(image, cache)?;

    let key = PixmapKey {
        image_id: image.id(),
        repetition: Some(repetition),
        width: if repetition == Repetition::Repeat { 0 } else { width },
        height: if repetition == Repetition::Repeat { 0 } else { height },
    };
    let pixmap = if repetition == Repetition::Repeat {
        base
    } else {
        cache.get_or_insert(key, || tile_pixmap(&base, repetition, width, height))?
    };
    let offset = tile_offset(repetition);

    let combined = *device
        * pattern.transform()
        * Matrix::translation(-(offset.0 as f64), -(offset.1 as f64));
    let Some(transform) = combined.to_skia() else {
        log::debug!(target: "surface", "pattern under a projective matrix skipped");
        return None;
    };
    let spread = if repetition == Repetition::Repeat {
        tiny_skia::SpreadMode::Repeat
    } else {
        tiny_skia::SpreadMode::Pad
    };
    Some(Shading::Pixmap {
        pixmap,
        spread,
        transform,
    })
}

/// Premultiplied pixmap of `image`, cached by image id.
pub(super) fn image_pixmap(image: &Image, cache: &mut PixmapCache) -> Option<Arc<Pixmap>> {
    cache.get_or_insert(PixmapKey::image(image), || match image.to_pixmap() {
        Ok(pixmap) => Some(pixmap),
        Err(err) => {
            log::warn!(target: "surface", "image {} not rasterized: {err}", image.id());
            None
        }
    })
}

fn with_opacity(color: Color, opacity: f32) -> tiny_skia::Color {
    let mut color: tiny_skia::Color = color.into();
    if opacity < 1.0 {
        color.set_alpha((color.alpha() * opacity).clamp(0.0, 1.0));
    }
    color
}

fn skia_point(x: f64, y: f64) -> tiny_skia::Point {
    tiny_skia::Point {
        x: x as f32,
        y: y as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::pattern::Pattern;

    #[test]
    fn test_solid_color_applies_opacity() {
        let shading = Shading::Solid(Color::rgb(255, 0, 0));
        match shading.shader(0.5, tiny_skia::FilterQuality::Nearest) {
            Some(tiny_skia::Shader::SolidColor(c)) => assert!((c.alpha() - 0.5).abs() < 1e-6),
            _ => panic!("expected a solid color"),
        }
    }

    #[test]
    fn test_gradient_without_stops_has_no_shader() {
        let gradient = Arc::new(Gradient::new_linear(Point::ZERO, Point::new(10.0, 0.0)));
        let shading = gradient_shading(&gradient, &Matrix::IDENTITY).unwrap();
        assert!(shading
            .shader(1.0, tiny_skia::FilterQuality::Nearest)
            .is_none());
    }

    #[test]
    fn test_projective_gradient_skipped() {
        let gradient = Arc::new(Gradient::new_linear(Point::ZERO, Point::new(10.0, 0.0)));
        let mut m = Matrix::IDENTITY;
        m.m31 = 0.01;
        assert!(gradient_shading(&gradient, &m).is_none());
    }

    #[test]
    fn test_pattern_shading_uses_cache() {
        let image = Arc::new(Image::filled(2, 2, Color::WHITE).unwrap());
        let pattern = Pattern::new(image, Repetition::NoRepeat);
        let mut cache = PixmapCache::new(1 << 20);
        let first = pattern_shading(&pattern, &Matrix::IDENTITY, &mut cache, (8, 8)).unwrap();
        let second = pattern_shading(&pattern, &Matrix::IDENTITY, &mut cache, (8, 8)).unwrap();
        match (first, second) {
            (
                Shading::Pixmap { pixmap: a, transform: ta, .. },
                Shading::Pixmap { pixmap: b, transform: tb, .. },
            ) => {
                assert!(Arc::ptr_eq(&a, &b));
                assert_eq!(ta, tb);
                assert_eq!(ta.tx, -1.0);
            }
            _ => panic!("expected pixmap shading"),
        }
    }
}
