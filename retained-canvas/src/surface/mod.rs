//! Rendering resources a canvas draws through.
//!
//! A canvas holds shared handles to a [`Surface`] (the pixel target) and,
//! optionally, a [`Device`], [`Backend`] and [`Context`]. Handles are `Arc`s:
//! several canvases may share one surface, and the surface lives until the last
//! holder drops it.

mod command;
mod raster;
mod recording;
mod threaded;

use std::fmt::Debug;

use crate::error::CanvasResult;
use crate::geometry::{Point, Rect, Size};
use crate::image::Image;

pub use command::{ClearCall, DrawCall, DrawCommand, Geometry, Layer};
pub use raster::RasterSurface;
pub use recording::{RecordedEvent, RecordingSurface};
pub use threaded::ThreadedSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendType {
    #[default]
    Software,
    OpenGl,
    Vulkan,
    Metal,
    Direct3D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    #[default]
    Cpu,
    Gpu,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceType {
    Window,
    #[default]
    Offscreen,
    Image,
    Texture,
    Framebuffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContextType {
    #[default]
    Immediate,
    Deferred,
    CommandBuffer,
}

/// A pixel target that executes draw commands.
///
/// Methods take `&self`: surfaces are shared and synchronize internally.
/// Commands submitted by one canvas must take effect in submission order.
pub trait Surface: Send + Sync + Debug {
    fn size(&self) -> Size;

    fn surface_type(&self) -> SurfaceType {
        SurfaceType::Offscreen
    }

    fn bounds(&self) -> Rect {
        Rect::from_size(self.size())
    }

    fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// True when the surface cannot take more work until it is flushed.
    fn is_full(&self) -> bool {
        false
    }

    fn contains_point(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }

    fn contains_rect(&self, rect: &Rect) -> bool {
        self.bounds().contains_rect(rect)
    }

    fn intersects_rect(&self, rect: &Rect) -> bool {
        self.bounds().intersects(rect)
    }

    /// Queue or execute one command.
    fn submit(&self, command: DrawCommand) -> CanvasResult<()>;

    /// Request execution of submitted work without waiting for it.
    fn flush(&self) -> CanvasResult<()> {
        Ok(())
    }

    /// Mark the end of a frame. Layers the canvas still has open are left
    /// open; only `EndLayer` closes them.
    fn finish(&self) -> CanvasResult<()> {
        self.flush()
    }

    /// Request a synchronization point after submitted work.
    fn sync(&self) -> CanvasResult<()> {
        self.flush()
    }

    /// Block until all submitted work has completed.
    fn wait(&self) -> CanvasResult<()> {
        Ok(())
    }

    /// Copy of the current pixels, for surfaces that hold any.
    fn snapshot(&self) -> Option<Image> {
        None
    }
}

/// A processing device (CPU, GPU).
pub trait Device: Send + Sync + Debug {
    fn device_type(&self) -> DeviceType;

    fn name(&self) -> &str {
        "unnamed device"
    }

    fn is_lost(&self) -> bool {
        false
    }
}

/// The rendering API a surface is driven by.
pub trait Backend: Send + Sync + Debug {
    fn backend_type(&self) -> BackendType;
}

/// How commands reach a backend.
pub trait Context: Send + Sync + Debug {
    fn context_type(&self) -> ContextType;
}

/// The CPU, as a device handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuDevice;

impl Device for CpuDevice {
    fn device_type(&self) -> DeviceType {
        DeviceType::Cpu
    }

    fn name(&self) -> &str {
        "cpu"
    }
}

/// The tiny-skia software rasterizer, as a backend handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareBackend;

impl Backend for SoftwareBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Software
    }
}

/// Commands executed as they are submitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateContext;

impl Context for ImmediateContext {
    fn context_type(&self) -> ContextType {
        ContextType::Immediate
    }
}
