//! The canvas state machine.
//!
//! A [`Canvas`] keeps the live [`CanvasState`] and a stack of saved states.
//! Draw calls compose the live matrix and clip with their geometry and paint,
//! then submit the result to the bound [`Surface`]. With no surface bound,
//! draw calls and completion requests are no-ops while transform and clip
//! state is still tracked.

mod clip;
mod drawing;
mod query;
mod transform;

use std::sync::Arc;

use crate::config::CanvasConfig;
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::Rect;
use crate::image::Image;
use crate::paint::Paint;
use crate::state::CanvasState;
use crate::surface::{
    Backend, Context, Device, DrawCommand, Layer, RasterSurface, Surface,
};
use crate::text::TextShaper;

/// One entry of the save stack.
enum SaveRecord {
    State(CanvasState),
    /// Saved by `save_layer`. `surface` is where the layer was begun, if any;
    /// the matching `restore` ends the layer there.
    Layer {
        state: CanvasState,
        surface: Option<Arc<dyn Surface>>,
    },
}

impl SaveRecord {
    fn state(&self) -> &CanvasState {
        match self {
            SaveRecord::State(state) | SaveRecord::Layer { state, .. } => state,
        }
    }
}

/// Stateful 2D drawing context over a shared surface.
///
/// Matrices post-multiply: after `translate(10, 10)` then `scale(2, 2)` a
/// point is scaled first and translated second.
pub struct Canvas {
    state: CanvasState,
    stack: Vec<SaveRecord>,
    surface: Option<Arc<dyn Surface>>,
    device: Option<Arc<dyn Device>>,
    backend: Option<Arc<dyn Backend>>,
    context: Option<Arc<dyn Context>>,
    config: CanvasConfig,
    shaper: Arc<dyn TextShaper>,
    /// Union of device bounds submitted since the last completion request.
    dirty_bounds: Option<Rect>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("state", &self.state)
            .field("save_count", &self.stack.len())
            .field("surface", &self.surface)
            .field("shaper", &self.shaper)
            .finish()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// A canvas with default configuration and no resources bound.
    pub fn new() -> Self {
        Self::with_config(CanvasConfig::default())
    }

    pub fn with_config(config: CanvasConfig) -> Self {
        let shaper = config.build_shaper();
        Self {
            state: CanvasState::with_paint(config.paint.clone()),
            stack: Vec::new(),
            surface: None,
            device: None,
            backend: None,
            context: None,
            config,
            shaper,
            dirty_bounds: None,
        }
    }

    pub fn from_surface(surface: Arc<dyn Surface>) -> Self {
        let mut canvas = Self::new();
        canvas.surface = Some(surface);
        canvas
    }

    pub fn from_device(device: Arc<dyn Device>) -> Self {
        let mut canvas = Self::new();
        canvas.device = Some(device);
        canvas
    }

    pub fn from_backend(backend: Arc<dyn Backend>) -> Self {
        let mut canvas = Self::new();
        canvas.backend = Some(backend);
        canvas
    }

    pub fn from_context(context: Arc<dyn Context>) -> Self {
        let mut canvas = Self::new();
        canvas.context = Some(context);
        canvas
    }

    /// A canvas drawing onto a raster copy of `image`.
    ///
    /// Returns `None` when no surface can hold the image.
    pub fn from_image(image: &Image) -> Option<Self> {
        match RasterSurface::from_image(image) {
            Ok(surface) => Some(Self::from_surface(Arc::new(surface))),
            Err(err) => {
                log::debug!(target: "canvas", "from_image: {err}");
                None
            }
        }
    }

    /// A canvas sharing this one's resources and live state, with an empty
    /// save stack.
    pub fn try_clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            stack: Vec::new(),
            surface: self.surface.clone(),
            device: self.device.clone(),
            backend: self.backend.clone(),
            context: self.context.clone(),
            config: self.config.clone(),
            shaper: Arc::clone(&self.shaper),
            dirty_bounds: None,
        }
    }

    // --- Resources ---

    pub fn surface(&self) -> Option<&Arc<dyn Surface>> {
        self.surface.as_ref()
    }

    pub fn set_surface(&mut self, surface: Option<Arc<dyn Surface>>) {
        log::debug!(target: "canvas", "set_surface {}", surface.is_some());
        self.surface = surface;
    }

    pub fn device(&self) -> Option<&Arc<dyn Device>> {
        self.device.as_ref()
    }

    pub fn set_device(&mut self, device: Option<Arc<dyn Device>>) {
        self.device = device;
    }

    pub fn backend(&self) -> Option<&Arc<dyn Backend>> {
        self.backend.as_ref()
    }

    pub fn set_backend(&mut self, backend: Option<Arc<dyn Backend>>) {
        self.backend = backend;
    }

    pub fn context(&self) -> Option<&Arc<dyn Context>> {
        self.context.as_ref()
    }

    pub fn set_context(&mut self, context: Option<Arc<dyn Context>>) {
        self.context = context;
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn text_shaper(&self) -> &Arc<dyn TextShaper> {
        &self.shaper
    }

    pub fn set_text_shaper(&mut self, shaper: Arc<dyn TextShaper>) {
        self.shaper = shaper;
    }

    // --- State ---

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    /// Paint used by the convenience draw calls (`fill_rect`, `fill_text`, ...).
    pub fn paint(&self) -> &Paint {
        &self.state.paint
    }

    pub fn paint_mut(&mut self) -> &mut Paint {
        &mut self.state.paint
    }

    pub fn set_paint(&mut self, paint: Paint) {
        self.state.paint = paint;
    }

    /// Number of saved states above the baseline.
    pub fn save_count(&self) -> usize {
        self.stack.len()
    }

    /// Push a copy of the live state.
    pub fn save(&mut self) {
        log::debug!(target: "canvas", "save");
        self.stack.push(SaveRecord::State(self.state.clone()));
    }

    /// Save, then direct draws to an offscreen layer until the matching
    /// `restore`, which composites it with `paint`'s opacity and blend mode.
    ///
    /// `bounds` is in user space; the layer covers `bounds` ∩ the current
    /// clip, or the whole clip without bounds. The save is recorded even when
    /// the surface rejects the layer, so `restore` stays balanced.
    pub fn save_layer(&mut self, bounds: Option<Rect>, paint: &Paint) -> CanvasResult<()> {
        log::debug!(target: "canvas", "save_layer {:?}", bounds);
        let layer = Layer {
            bounds: self.layer_bounds(bounds),
            opacity: paint.opacity(),
            blend_mode: paint.blend_mode(),
            clip: self.state.clip.clone(),
        };

        let mut result = Ok(());
        let surface = match &self.surface {
            Some(surface) => match surface.submit(DrawCommand::BeginLayer(layer)) {
                Ok(()) => Some(Arc::clone(surface)),
                Err(err) => {
                    log::warn!(target: "canvas", "begin layer failed: {err}");
                    self.state.valid = false;
                    result = Err(err);
                    None
                }
            },
            None => None,
        };
        self.stack.push(SaveRecord::Layer {
            state: self.state.clone(),
            surface,
        });
        result
    }

    /// `save_layer` with opacity `alpha / 255` and normal blending.
    pub fn save_layer_alpha(&mut self, bounds: Option<Rect>, alpha: u8) -> CanvasResult<()> {
        let paint = Paint::new().with_opacity(alpha as f64 / 255.0);
        self.save_layer(bounds, &paint)
    }

    /// Device bounds of a new layer, or `None` for the whole surface.
    fn layer_bounds(&self, bounds: Option<Rect>) -> Option<Rect> {
        let mut area = bounds.and_then(|b| match self.state.matrix.map_rect(&b) {
            Ok(mapped) => Some(mapped),
            Err(err) => {
                log::debug!(target: "canvas", "layer bounds unmapped: {err}");
                None
            }
        });
        for limit in [
            self.state.clip.bounds(),
            self.surface.as_ref().map(|s| s.bounds()),
        ]
        .into_iter()
        .flatten()
        {
            area = Some(match area {
                Some(a) => a
                    .intersection(&limit)
                    .unwrap_or_else(|| Rect::new(limit.x, limit.y, 0.0, 0.0)),
                None => limit,
            });
        }
        area
    }

    /// Pop the most recent save and reinstate its matrix, clip and paint.
    ///
    /// A layer saved by `save_layer` is composited first. With nothing saved
    /// this is a no-op. Status flags (`dirty`, `valid`, `ready`) describe the
    /// live canvas and are not rolled back.
    pub fn restore(&mut self) {
        let Some(record) = self.stack.pop() else {
            log::debug!(target: "canvas", "restore with nothing saved");
            return;
        };
        log::debug!(target: "canvas", "restore");

        let mut failed = false;
        let saved = match record {
            SaveRecord::State(state) => state,
            SaveRecord::Layer { state, surface } => {
                if let Some(surface) = surface {
                    if let Err(err) = surface.submit(DrawCommand::EndLayer) {
                        log::warn!(target: "canvas", "end layer failed: {err}");
                        failed = true;
                    }
                }
                state
            }
        };

        let CanvasState {
            dirty,
            valid,
            ready,
            ..
        } = self.state;
        self.state = CanvasState {
            dirty,
            valid: valid && !failed,
            ready,
            ..saved
        };
    }

    /// Restore until at most `count` saves remain.
    pub fn restore_to_count(&mut self, count: usize) {
        while self.stack.len() > count {
            self.restore();
        }
    }

    /// Whether the innermost save is a layer.
    pub fn in_layer(&self) -> bool {
        matches!(self.stack.last(), Some(SaveRecord::Layer { .. }))
    }

    /// Number of open layers.
    pub fn layer_count(&self) -> usize {
        self.stack
            .iter()
            .filter(|r| matches!(r, SaveRecord::Layer { .. }))
            .count()
    }

    /// The state recorded by the `index`-th save, oldest first.
    pub fn saved_state(&self, index: usize) -> Option<&CanvasState> {
        self.stack.get(index).map(SaveRecord::state)
    }

    // --- Lifecycle ---

    fn complete(
        &mut self,
        name: &str,
        request: impl FnOnce(&dyn Surface) -> CanvasResult<()>,
    ) -> CanvasResult<()> {
        log::debug!(target: "canvas", "{name}");
        if let Some(surface) = self.surface.clone() {
            if let Err(err) = request(surface.as_ref()) {
                log::warn!(target: "canvas", "{name} failed: {err}");
                self.state.valid = false;
                return Err(err);
            }
        }
        self.state.dirty = false;
        self.dirty_bounds = None;
        Ok(())
    }

    /// Ask the surface to start executing submitted work. Does not block.
    pub fn flush(&mut self) -> CanvasResult<()> {
        self.complete("flush", |s| s.flush())
    }

    /// Mark the end of a frame. Does not block.
    pub fn finish(&mut self) -> CanvasResult<()> {
        self.complete("finish", |s| s.finish())
    }

    /// Request a synchronization point. Does not block.
    pub fn sync(&mut self) -> CanvasResult<()> {
        self.complete("sync", |s| s.sync())
    }

    /// Block until the surface has completed all submitted work.
    pub fn wait(&mut self) -> CanvasResult<()> {
        self.complete("wait", |s| s.wait())
    }

    /// Unwind every save (compositing open layers) and return to the
    /// configured defaults.
    pub fn reset(&mut self) {
        log::debug!(target: "canvas", "reset");
        self.restore_to_count(0);
        self.state = CanvasState::with_paint(self.config.paint.clone());
        self.dirty_bounds = None;
    }

    /// Flag the canvas as unusable until `validate` succeeds.
    pub fn invalidate(&mut self) {
        log::debug!(target: "canvas", "invalidate");
        self.state.valid = false;
    }

    /// Re-check the bound resources and clear the invalid flag if they are
    /// usable. Returns the new validity.
    pub fn validate(&mut self) -> bool {
        let device_lost = self.device.as_ref().is_some_and(|d| d.is_lost());
        self.state.valid = !device_lost;
        self.state.ready = !device_lost;
        log::debug!(target: "canvas", "validate -> {}", self.state.valid);
        self.state.valid
    }

    /// Fail with `DeviceLost` when the bound device reports it.
    pub fn check_device(&self) -> CanvasResult<()> {
        match &self.device {
            Some(device) if device.is_lost() => Err(CanvasError::DeviceLost),
            _ => Ok(()),
        }
    }

    /// Submit one command, invalidating the canvas when the surface rejects it.
    fn submit(&mut self, surface: &dyn Surface, command: DrawCommand) -> CanvasResult<()> {
        let name = command.name();
        surface.submit(command).map_err(|err| {
            log::warn!(target: "canvas", "{name} rejected: {err}");
            self.state.valid = false;
            err
        })
    }

    /// Flag pixels as submitted and grow the dirty area by what the draw may
    /// touch, or by everything visible when its extent is unknown.
    fn mark_dirty(&mut self, device_bounds: Option<Rect>) {
        self.state.dirty = true;
        let visible = self.visible_bounds();
        let area = match (device_bounds, visible) {
            (Some(bounds), Some(visible)) => bounds.intersection(&visible),
            (Some(bounds), None) => Some(bounds),
            (None, visible) => visible,
        };
        if let Some(area) = area {
            self.dirty_bounds = Some(match self.dirty_bounds {
                Some(current) => current.union(&area),
                None => area,
            });
        }
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        let open = self.layer_count();
        if open > 0 {
            log::debug!(target: "canvas", "closing {open} layer(s) on drop");
            self.restore_to_count(0);
        }
    }
}
