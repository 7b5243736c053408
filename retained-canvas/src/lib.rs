//! Retained 2D canvas state machine over pluggable surfaces.
//!
//! A [`Canvas`] tracks a transform matrix, a clip and a default paint, with a
//! save/restore stack that can also open offscreen layers. Each draw call is
//! composed with that state into a self-contained [`DrawCommand`] and handed
//! to a shared [`Surface`]. The crate ships:
//! - [`RasterSurface`], a `tiny-skia` rasterizer with PNG export
//! - [`RecordingSurface`], which keeps every command for inspection or replay
//! - [`ThreadedSurface`], which executes another surface on a worker thread
//!
//! Text is measured and outlined by a [`TextShaper`]: `cosmic-text` against a
//! `fontdb` database, or a font-free approximation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use retained_canvas::{Canvas, Color, Paint, RasterSurface, Rect};
//!
//! # fn main() -> retained_canvas::CanvasResult<()> {
//! let surface = Arc::new(RasterSurface::new(200, 100)?);
//! let mut canvas = Canvas::from_surface(surface.clone());
//! canvas.clear(Color::WHITE)?;
//! canvas.translate(10.0, 10.0);
//! canvas.scale(2.0, 2.0);
//! canvas.draw_rect(Rect::new(0.0, 0.0, 20.0, 10.0), &Paint::fill(Color::rgb(200, 0, 0)))?;
//! canvas.finish()?;
//! let png_data = surface.to_png(None)?;
//! # let _ = png_data;
//! # Ok(())
//! # }
//! ```

mod canvas;
mod clip;
mod config;
mod error;
mod font_config;
mod geometry;
mod gradient;
mod image;
mod matrix;
mod paint;
mod path;
mod pattern;
mod region;
mod shader;
mod state;
mod style;
mod surface;
mod text;

// Re-export public API
pub use canvas::Canvas;
pub use clip::{Clip, ClipElement, ClipKind, ClipOp, ClipShape};
pub use config::{CanvasConfig, TextEngine};
pub use error::{CanvasError, CanvasResult, ErrorKind};
pub use font_config::{FontConfig, FontSource, GenericFamily, GenericFamilyMap};
pub use geometry::{ArcParams, Color, ImageRectParams, Point, Rect, RoundRectParams, Size};
pub use gradient::{Gradient, GradientStop, GradientType, SpreadMode};
pub use image::{Image, ImageData, MAX_IMAGE_DIMENSION};
pub use matrix::{Matrix, SINGULAR_EPSILON, W_EPSILON};
pub use paint::{
    ActiveSource, Filter, Paint, PaintSource, Shadow, StrokeDash, TextStyle, DEFAULT_FONT_FAMILY,
    DEFAULT_TEXT_SIZE,
};
pub use path::{Path, PathMeasure};
pub use pattern::{Pattern, Repetition};
pub use region::Region;
pub use shader::{Shader, ShaderKind};
pub use state::CanvasState;
pub use style::{
    AntialiasMode, BlendMode, FillRule, FilterQuality, FilterType, FontStretch, FontStyle,
    FontWeight, LineCap, LineJoin, MemoryType, PaintStyle, PointMode, RenderingHint,
    SrcRectConstraint, TextAlign, TextBaseline, TextRenderingMode,
};
pub use surface::{
    Backend, BackendType, ClearCall, Context, ContextType, CpuDevice, Device, DeviceType,
    DrawCall, DrawCommand, Geometry, ImmediateContext, Layer, RasterSurface, RecordedEvent,
    RecordingSurface, SoftwareBackend, Surface, SurfaceType, ThreadedSurface,
};
pub use text::{
    ApproximateShaper, CosmicTextShaper, TextBlob, TextMetrics, TextRun, TextShaper,
    DEFAULT_ADVANCE_FACTOR,
};
