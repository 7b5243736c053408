//! Canvas construction settings.

use std::sync::Arc;

use crate::font_config::FontConfig;
use crate::paint::Paint;
use crate::text::{ApproximateShaper, CosmicTextShaper, TextShaper, DEFAULT_ADVANCE_FACTOR};

/// Which shaper a canvas measures and outlines text with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEngine {
    /// Estimates from character counts; draws no glyphs.
    #[default]
    Approximate,
    /// cosmic-text against the configured fonts.
    CosmicText,
}

/// Settings a canvas starts from and returns to on `reset`.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Paint used by the convenience draw calls until replaced.
    pub paint: Paint,
    pub fonts: FontConfig,
    pub text_engine: TextEngine,
    /// Per-character advance used by the approximate shaper, relative to
    /// the text size.
    pub advance_factor: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            paint: Paint::default(),
            fonts: FontConfig::default(),
            text_engine: TextEngine::default(),
            advance_factor: DEFAULT_ADVANCE_FACTOR,
        }
    }
}

impl CanvasConfig {
    pub fn with_paint(mut self, paint: Paint) -> Self {
        self.paint = paint;
        self
    }

    pub fn with_text_engine(mut self, engine: TextEngine) -> Self {
        self.text_engine = engine;
        self
    }

    pub fn with_fonts(mut self, fonts: FontConfig) -> Self {
        self.fonts = fonts;
        self
    }

    /// Build the configured shaper. `CosmicText` scans the font database.
    pub fn build_shaper(&self) -> Arc<dyn TextShaper> {
        match self.text_engine {
            TextEngine::Approximate => Arc::new(ApproximateShaper::new(self.advance_factor)),
            TextEngine::CosmicText => Arc::new(CosmicTextShaper::new(&self.fonts)),
        }
    }
}
