//! Raster images and raw pixel buffer ingestion.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{Color, Rect, Size};

/// Largest accepted image edge in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 16384;

/// Global counter for image IDs.
static IMAGE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A borrowed raw pixel buffer.
///
/// Pixel `(x, y)` starts at byte `y * stride + x * channels`. Channel layouts
/// are gray (1), gray + alpha (2), RGB (3) and RGBA (4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageData<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    /// Bytes per row.
    pub stride: usize,
}

impl<'a> ImageData<'a> {
    /// Tightly packed buffer: stride is `width * channels`.
    pub fn new(data: &'a [u8], width: u32, height: u32, channels: u32) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            stride: width as usize * channels as usize,
        }
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    fn row_len(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.channels as usize)
    }

    /// Bytes needed to hold every addressed pixel, or `None` on overflow.
    fn required_len(&self) -> Option<usize> {
        if self.height == 0 {
            return Some(0);
        }
        (self.height as usize - 1)
            .checked_mul(self.stride)?
            .checked_add(self.row_len()?)
    }

    /// Non-empty data, positive dimensions and channel count, and a buffer
    /// large enough for every row.
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
            && self.width > 0
            && self.height > 0
            && self.channels > 0
            && self.row_len().is_some_and(|row| self.stride >= row)
            && self
                .required_len()
                .is_some_and(|len| self.data.len() >= len)
    }

    /// Channel bytes of pixel `(x, y)`, or `None` when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&'a [u8]> {
        if x >= self.width || y >= self.height || self.channels == 0 {
            return None;
        }
        let channels = self.channels as usize;
        let offset = (y as usize)
            .checked_mul(self.stride)?
            .checked_add((x as usize).checked_mul(channels)?)?;
        self.data.get(offset..offset.checked_add(channels)?)
    }
}

/// An immutable RGBA image (8 bits per channel, not premultiplied).
///
/// Images are shared between paints, patterns and draw calls through `Arc`.
#[derive(Debug, Clone)]
pub struct Image {
    id: u64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    /// Create an image from tightly packed RGBA bytes.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> CanvasResult<Self> {
        check_dimensions(width, height)?;
        let expected_len = width as usize * height as usize * 4;
        if data.len() != expected_len {
            return Err(CanvasError::InvalidParameter(format!(
                "Data length {} does not match expected {} for {}x{} RGBA image",
                data.len(),
                expected_len,
                width,
                height
            )));
        }
        Ok(Self {
            id: IMAGE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            pixels: data,
        })
    }

    /// Image filled with one color.
    pub fn filled(width: u32, height: u32, color: Color) -> CanvasResult<Self> {
        check_dimensions(width, height)?;
        let pixels = [color.r, color.g, color.b, color.a]
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::from_rgba(pixels, width, height)
    }

    /// Convert a raw pixel buffer into an RGBA image.
    pub fn from_image_data(data: &ImageData) -> CanvasResult<Self> {
        if !data.is_valid() {
            return Err(CanvasError::InvalidParameter(format!(
                "invalid image data: {}x{} with {} channels, stride {}, {} bytes",
                data.width,
                data.height,
                data.channels,
                data.stride,
                data.data.len()
            )));
        }
        if !(1..=4).contains(&data.channels) {
            return Err(CanvasError::UnsupportedFormat(format!(
                "{} channels per pixel",
                data.channels
            )));
        }
        check_dimensions(data.width, data.height)?;

        let mut pixels = Vec::with_capacity(data.width as usize * data.height as usize * 4);
        for y in 0..data.height {
            for x in 0..data.width {
                let px = data.pixel(x, y).ok_or_else(|| {
                    CanvasError::InvalidParameter(format!("pixel ({x}, {y}) out of range"))
                })?;
                let rgba = match *px {
                    [g] => [g, g, g, 255],
                    [g, a] => [g, g, g, a],
                    [r, g, b] => [r, g, b, 255],
                    [r, g, b, a] => [r, g, b, a],
                    _ => {
                        return Err(CanvasError::UnsupportedFormat(format!(
                            "{} channels per pixel",
                            data.channels
                        )))
                    }
                };
                pixels.extend_from_slice(&rgba);
            }
        }
        Self::from_rgba(pixels, data.width, data.height)
    }

    /// Create an image from a premultiplied pixmap, un-premultiplying each pixel.
    pub(crate) fn from_pixmap(pixmap: &tiny_skia::Pixmap) -> CanvasResult<Self> {
        let mut pixels = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Self::from_rgba(pixels, pixmap.width(), pixmap.height())
    }

    /// Premultiplied pixmap copy for rasterization.
    pub(crate) fn to_pixmap(&self) -> CanvasResult<tiny_skia::Pixmap> {
        let mut pixmap =
            tiny_skia::Pixmap::new(self.width, self.height).ok_or(CanvasError::OutOfMemory)?;
        for (pixel, rgba) in pixmap.pixels_mut().iter_mut().zip(self.pixels.chunks_exact(4)) {
            *pixel = tiny_skia::ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply();
        }
        Ok(pixmap)
    }

    /// Identifier unique within the process, used for caching.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.size())
    }

    /// RGBA bytes in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[offset..offset + 4];
        Some(Color::rgba(px[0], px[1], px[2], px[3]))
    }
}

fn check_dimensions(width: u32, height: u32) -> CanvasResult<()> {
    if width == 0 || height == 0 {
        return Err(CanvasError::InvalidParameter(
            "Image dimensions must be non-zero".to_string(),
        ));
    }
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(CanvasError::InvalidParameter(format!(
            "Image size {}x{} exceeds maximum {}x{}",
            width, height, MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION
        )));
    }
    Ok(())
}
