//! Text measurement and glyph outlines.
//!
//! The canvas never lays out glyphs itself; it asks a [`TextShaper`] for
//! metrics and outlines. [`CosmicTextShaper`] shapes with cosmic-text against
//! a fontdb database. [`ApproximateShaper`] needs no fonts and estimates
//! every glyph as a fixed fraction of the text size.

use std::fmt;
use std::sync::{Arc, Mutex};

use cosmic_text::{Attrs, Buffer, CacheKeyFlags, Command, Family, FontSystem, Metrics, Shaping};

use crate::font_config::FontConfig;
use crate::geometry::{Point, Rect};
use crate::paint::TextStyle;
use crate::path::Path;
use crate::style::{TextAlign, TextBaseline};

/// Default advance of one character, as a fraction of the text size.
pub const DEFAULT_ADVANCE_FACTOR: f64 = 0.6;

/// Line height as a multiple of the text size.
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Line box relative to the first baseline's start.
    pub bounds: Rect,
}

/// Measured extent of a string.
///
/// Distances are relative to the start of the first baseline; `ascent` is
/// above it, `descent` below it down to the bottom of the last line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
    pub runs: Vec<TextRun>,
}

impl TextMetrics {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }

    /// Bounding box relative to the start of the first baseline.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, -self.ascent, self.width, self.height())
    }

    /// Where the first baseline starts when the text is anchored at the
    /// origin with `align` and `baseline`.
    pub fn anchor_offset(&self, align: TextAlign, baseline: TextBaseline) -> Point {
        let x = match align {
            TextAlign::Left | TextAlign::Justify => 0.0,
            TextAlign::Center => -self.width / 2.0,
            TextAlign::Right => -self.width,
        };
        let y = match baseline {
            TextBaseline::Top => self.ascent,
            TextBaseline::Middle => self.ascent / 2.0 - self.descent / 2.0,
            TextBaseline::Alphabetic => 0.0,
            TextBaseline::Ideographic => -self.descent * 0.5,
            TextBaseline::Bottom => -self.descent,
        };
        Point::new(x, y)
    }
}

/// Shaped text ready to draw.
///
/// Coordinates are relative to the start of the first baseline.
#[derive(Debug, Clone)]
pub struct TextBlob {
    pub text: String,
    pub runs: Vec<TextRun>,
    pub bounds: Rect,
    /// Glyph outlines, when the shaper had fonts to draw them from.
    pub outline: Option<Arc<Path>>,
}

impl TextBlob {
    pub fn metrics(&self) -> TextMetrics {
        TextMetrics {
            width: self.bounds.width,
            ascent: -self.bounds.y,
            descent: self.bounds.bottom(),
            runs: self.runs.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Measures and shapes text for a canvas.
pub trait TextShaper: Send + Sync + fmt::Debug {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;

    fn shape(&self, text: &str, style: &TextStyle) -> TextBlob;
}

/// Estimates text without fonts: each character advances by
/// `advance_factor * size`, lines are `1.2 * size` apart and each line box
/// spans `0.8 * size` above its baseline and `0.2 * size` below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateShaper {
    pub advance_factor: f64,
}

impl Default for ApproximateShaper {
    fn default() -> Self {
        Self {
            advance_factor: DEFAULT_ADVANCE_FACTOR,
        }
    }
}

impl ApproximateShaper {
    pub fn new(advance_factor: f64) -> Self {
        if advance_factor.is_finite() && advance_factor > 0.0 {
            Self { advance_factor }
        } else {
            Self::default()
        }
    }
}

impl TextShaper for ApproximateShaper {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let size = style.size;
        let ascent = size * 0.8;
        let line_height = size * LINE_HEIGHT_FACTOR;
        if text.is_empty() {
            return TextMetrics {
                width: 0.0,
                ascent,
                descent: size * 0.2,
                runs: Vec::new(),
            };
        }

        let runs: Vec<TextRun> = text
            .split('\n')
            .enumerate()
            .map(|(i, line)| TextRun {
                text: line.to_string(),
                bounds: Rect::new(
                    0.0,
                    i as f64 * line_height - ascent,
                    line.chars().count() as f64 * size * self.advance_factor,
                    size,
                ),
            })
            .collect();
        let width = runs.iter().map(|r| r.bounds.width).fold(0.0, f64::max);
        let descent = runs.last().map_or(0.0, |r| r.bounds.bottom());
        TextMetrics {
            width,
            ascent,
            descent,
            runs,
        }
    }

    fn shape(&self, text: &str, style: &TextStyle) -> TextBlob {
        let metrics = self.measure(text, style);
        TextBlob {
            text: text.to_string(),
            bounds: metrics.bounds(),
            runs: metrics.runs,
            outline: None,
        }
    }
}

struct FontState {
    font_system: FontSystem,
    swash_cache: cosmic_text::SwashCache,
}

/// Shapes text with cosmic-text and extracts glyph outlines through swash.
pub struct CosmicTextShaper {
    state: Mutex<FontState>,
    hinting: bool,
}

impl fmt::Debug for CosmicTextShaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmicTextShaper")
            .field("hinting", &self.hinting)
            .finish()
    }
}

impl CosmicTextShaper {
    /// Build the font database described by `config`.
    pub fn new(config: &FontConfig) -> Self {
        let db = config.build_database();
        Self {
            state: Mutex::new(FontState {
                font_system: FontSystem::new_with_locale_and_db("en".to_string(), db),
                swash_cache: cosmic_text::SwashCache::new(),
            }),
            hinting: config.hinting,
        }
    }

    /// Shape `text` and hand the laid-out buffer to `f`.
    fn with_buffer<R>(
        &self,
        text: &str,
        style: &TextStyle,
        f: impl FnOnce(&Buffer, &mut FontState) -> R,
    ) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let size = style.size as f32;
        let metrics = Metrics::new(size, size * LINE_HEIGHT_FACTOR as f32);
        let mut buffer = Buffer::new(&mut state.font_system, metrics);

        let flags = if self.hinting {
            CacheKeyFlags::empty()
        } else {
            CacheKeyFlags::DISABLE_HINTING
        };
        let attrs = Attrs::new()
            .family(family(&style.family))
            .weight(style.weight.into())
            .style(style.style.into())
            .stretch(style.stretch.into())
            .cache_key_flags(flags);

        buffer.set_text(&mut state.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut state.font_system, false);
        f(&buffer, &mut *state)
    }

    fn layout_metrics(buffer: &Buffer, size: f64) -> TextMetrics {
        let mut first_baseline = None;
        let mut runs = Vec::new();
        let mut width: f64 = 0.0;
        for run in buffer.layout_runs() {
            let baseline = *first_baseline.get_or_insert(run.line_y as f64);
            width = width.max(run.line_w as f64);
            runs.push(TextRun {
                text: run.text.to_string(),
                bounds: Rect::new(
                    0.0,
                    run.line_top as f64 - baseline,
                    run.line_w as f64,
                    run.line_height as f64,
                ),
            });
        }

        let (ascent, descent) = match (runs.first(), runs.last()) {
            (Some(first), Some(last)) => (-first.bounds.y, last.bounds.bottom()),
            _ => (size * 0.8, size * 0.2),
        };
        TextMetrics {
            width,
            ascent,
            descent,
            runs,
        }
    }
}

impl TextShaper for CosmicTextShaper {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        self.with_buffer(text, style, |buffer, _| {
            Self::layout_metrics(buffer, style.size)
        })
    }

    fn shape(&self, text: &str, style: &TextStyle) -> TextBlob {
        self.with_buffer(text, style, |buffer, state| {
            let metrics = Self::layout_metrics(buffer, style.size);
            let first_baseline = buffer
                .layout_runs()
                .next()
                .map_or(0.0, |run| run.line_y);

            let mut outline = Path::new();
            let mut glyphs = 0usize;
            for run in buffer.layout_runs() {
                let baseline = run.line_y - first_baseline;
                for glyph in run.glyphs.iter() {
                    let physical = glyph.physical((0.0, 0.0), 1.0);
                    let Some(commands) = state
                        .swash_cache
                        .get_outline_commands(&mut state.font_system, physical.cache_key)
                    else {
                        continue;
                    };
                    let gx = (glyph.x + glyph.font_size * glyph.x_offset) as f64;
                    let gy = (baseline + glyph.y - glyph.font_size * glyph.y_offset) as f64;
                    append_outline(&mut outline, commands, gx, gy);
                    glyphs += 1;
                }
            }
            log::trace!(target: "text", "shaped {glyphs} glyphs for {text:?}");

            TextBlob {
                text: text.to_string(),
                bounds: metrics.bounds(),
                runs: metrics.runs,
                outline: (!outline.is_empty()).then(|| Arc::new(outline)),
            }
        })
    }
}

/// Append swash outline commands at (`dx`, `dy`). Font space is y-up.
fn append_outline(path: &mut Path, commands: &[Command], dx: f64, dy: f64) {
    let x = |v: f32| dx + v as f64;
    let y = |v: f32| dy - v as f64;
    for command in commands {
        match *command {
            Command::MoveTo(p) => path.move_to(x(p.x), y(p.y)),
            Command::LineTo(p) => path.line_to(x(p.x), y(p.y)),
            Command::QuadTo(c, p) => path.quad_to(x(c.x), y(c.y), x(p.x), y(p.y)),
            Command::CurveTo(c1, c2, p) => {
                path.cubic_to(x(c1.x), y(c1.y), x(c2.x), y(c2.y), x(p.x), y(p.y))
            }
            Command::Close => path.close(),
        }
    }
}

/// Map a family name to cosmic-text, recognising the CSS generic families.
fn family(name: &str) -> Family<'_> {
    match name.trim().to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "" => Family::SansSerif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn style(size: f64) -> TextStyle {
        TextStyle {
            size,
            ..TextStyle::default()
        }
    }

    #[test]
    fn test_approximate_measure() {
        let shaper = ApproximateShaper::default();
        let metrics = shaper.measure("hello", &style(10.0));
        assert!((metrics.width - 30.0).abs() < 1e-9);
        assert!((metrics.ascent - 8.0).abs() < 1e-9);
        assert_eq!(metrics.runs.len(), 1);
    }

    #[test]
    fn test_approximate_multiline() {
        let shaper = ApproximateShaper::new(0.5);
        let metrics = shaper.measure("ab\nabcd", &style(10.0));
        assert_eq!(metrics.runs.len(), 2);
        assert!((metrics.width - 20.0).abs() < 1e-9);
        // Second baseline is 12 below the first.
        assert!((metrics.descent - 14.0).abs() < 1e-9);
        assert!((metrics.height() - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_approximate_invalid_factor_uses_default() {
        assert_eq!(ApproximateShaper::new(f64::NAN), ApproximateShaper::default());
        assert_eq!(ApproximateShaper::new(-1.0), ApproximateShaper::default());
    }

    #[test]
    fn test_approximate_shape_has_no_outline() {
        let blob = ApproximateShaper::default().shape("x", &style(10.0));
        assert!(blob.outline.is_none());
        assert_eq!(blob.bounds, Rect::new(0.0, -8.0, 6.0, 10.0));
        assert_eq!(blob.metrics().width, 6.0);
    }

    #[rstest]
    #[case(TextAlign::Left, 0.0)]
    #[case(TextAlign::Justify, 0.0)]
    #[case(TextAlign::Center, -50.0)]
    #[case(TextAlign::Right, -100.0)]
    fn test_anchor_offset_align(#[case] align: TextAlign, #[case] expected: f64) {
        let metrics = TextMetrics {
            width: 100.0,
            ascent: 8.0,
            descent: 2.0,
            runs: Vec::new(),
        };
        assert_eq!(metrics.anchor_offset(align, TextBaseline::Alphabetic).x, expected);
    }

    #[rstest]
    #[case(TextBaseline::Top, 8.0)]
    #[case(TextBaseline::Middle, 3.0)]
    #[case(TextBaseline::Alphabetic, 0.0)]
    #[case(TextBaseline::Bottom, -2.0)]
    fn test_anchor_offset_baseline(#[case] baseline: TextBaseline, #[case] expected: f64) {
        let metrics = TextMetrics {
            width: 0.0,
            ascent: 8.0,
            descent: 2.0,
            runs: Vec::new(),
        };
        assert_eq!(metrics.anchor_offset(TextAlign::Left, baseline).y, expected);
    }

    #[test]
    fn test_family_mapping() {
        assert_eq!(family("sans-serif"), Family::SansSerif);
        assert_eq!(family("Monospace"), Family::Monospace);
        assert_eq!(family(" Arial "), Family::Name("Arial"));
    }

    #[test]
    fn test_cosmic_shaper_without_fonts() {
        let shaper = CosmicTextShaper::new(&FontConfig::isolated(Vec::new()));
        let metrics = shaper.measure("", &style(10.0));
        assert_eq!(metrics.width, 0.0);
        let blob = shaper.shape("", &style(10.0));
        assert!(blob.outline.is_none());
    }
}
