//! Style enums shared by paints, paths and surfaces.

use std::str::FromStr;

use crate::error::CanvasError;

/// Whether geometry is filled, stroked, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaintStyle {
    #[default]
    Fill,
    Stroke,
    FillAndStroke,
}

impl PaintStyle {
    pub fn fills(self) -> bool {
        matches!(self, PaintStyle::Fill | PaintStyle::FillAndStroke)
    }

    pub fn strokes(self) -> bool {
        matches!(self, PaintStyle::Stroke | PaintStyle::FillAndStroke)
    }
}

/// Line cap style for stroke operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineCap {
    /// Flat edge at the endpoint.
    #[default]
    Butt,
    /// Rounded edge extending past the endpoint.
    Round,
    /// Square edge extending past the endpoint.
    Square,
}

impl From<LineCap> for tiny_skia::LineCap {
    fn from(cap: LineCap) -> Self {
        match cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        }
    }
}

/// Line join style for stroke operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineJoin {
    /// Sharp corner.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Beveled corner.
    Bevel,
}

impl From<LineJoin> for tiny_skia::LineJoin {
    fn from(join: LineJoin) -> Self {
        match join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        }
    }
}

/// Fill rule for path operations.
///
/// Determines how the interior of a path is calculated when filling
/// and when testing containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillRule {
    /// Non-zero winding rule (default).
    #[default]
    NonZero,
    /// Even-odd rule.
    EvenOdd,
}

impl FillRule {
    /// Whether a winding number counts as inside under this rule.
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }
}

impl From<FillRule> for tiny_skia::FillRule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => tiny_skia::FillRule::Winding,
            FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        }
    }
}

/// Edge antialiasing quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AntialiasMode {
    None,
    Fast,
    #[default]
    High,
    Best,
}

impl AntialiasMode {
    pub fn is_enabled(self) -> bool {
        self != AntialiasMode::None
    }
}

/// Blend mode used when compositing a draw or a layer onto its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl FromStr for BlendMode {
    type Err = CanvasError;

    /// Parse a CSS `mix-blend-mode` keyword. `source-over` is accepted for `normal`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s {
            "normal" | "source-over" => BlendMode::Normal,
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "overlay" => BlendMode::Overlay,
            "darken" => BlendMode::Darken,
            "lighten" => BlendMode::Lighten,
            "color-dodge" => BlendMode::ColorDodge,
            "color-burn" => BlendMode::ColorBurn,
            "hard-light" => BlendMode::HardLight,
            "soft-light" => BlendMode::SoftLight,
            "difference" => BlendMode::Difference,
            "exclusion" => BlendMode::Exclusion,
            "hue" => BlendMode::Hue,
            "saturation" => BlendMode::Saturation,
            "color" => BlendMode::Color,
            "luminosity" => BlendMode::Luminosity,
            other => {
                return Err(CanvasError::InvalidParameter(format!(
                    "unknown blend mode: {other}"
                )))
            }
        };
        Ok(mode)
    }
}

impl From<BlendMode> for tiny_skia::BlendMode {
    fn from(mode: BlendMode) -> Self {
        match mode {
            BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
            BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
            BlendMode::Screen => tiny_skia::BlendMode::Screen,
            BlendMode::Overlay => tiny_skia::BlendMode::Overlay,
            BlendMode::Darken => tiny_skia::BlendMode::Darken,
            BlendMode::Lighten => tiny_skia::BlendMode::Lighten,
            BlendMode::ColorDodge => tiny_skia::BlendMode::ColorDodge,
            BlendMode::ColorBurn => tiny_skia::BlendMode::ColorBurn,
            BlendMode::HardLight => tiny_skia::BlendMode::HardLight,
            BlendMode::SoftLight => tiny_skia::BlendMode::SoftLight,
            BlendMode::Difference => tiny_skia::BlendMode::Difference,
            BlendMode::Exclusion => tiny_skia::BlendMode::Exclusion,
            BlendMode::Hue => tiny_skia::BlendMode::Hue,
            BlendMode::Saturation => tiny_skia::BlendMode::Saturation,
            BlendMode::Color => tiny_skia::BlendMode::Color,
            BlendMode::Luminosity => tiny_skia::BlendMode::Luminosity,
        }
    }
}

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    /// Treated as `Left` for single-line text.
    Justify,
}

/// Vertical text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextBaseline {
    /// Top of the em square.
    Top,
    /// Middle of the em square.
    Middle,
    /// Bottom of the em square.
    Bottom,
    /// Alphabetic baseline.
    #[default]
    Alphabetic,
    /// Ideographic baseline.
    Ideographic,
}

/// How glyph outlines are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextRenderingMode {
    #[default]
    Fill,
    Stroke,
    FillAndStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillAndStrokeClip,
    Clip,
}

impl TextRenderingMode {
    pub fn fills(self) -> bool {
        matches!(
            self,
            TextRenderingMode::Fill
                | TextRenderingMode::FillAndStroke
                | TextRenderingMode::FillClip
                | TextRenderingMode::FillAndStrokeClip
        )
    }

    pub fn strokes(self) -> bool {
        matches!(
            self,
            TextRenderingMode::Stroke
                | TextRenderingMode::FillAndStroke
                | TextRenderingMode::StrokeClip
                | TextRenderingMode::FillAndStrokeClip
        )
    }
}

/// Font slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl From<FontStyle> for cosmic_text::Style {
    fn from(style: FontStyle) -> Self {
        match style {
            FontStyle::Normal => cosmic_text::Style::Normal,
            FontStyle::Italic => cosmic_text::Style::Italic,
            FontStyle::Oblique => cosmic_text::Style::Oblique,
        }
    }
}

/// Font weight on the CSS 100-900 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const EXTRA_LIGHT: FontWeight = FontWeight(200);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const SEMI_BOLD: FontWeight = FontWeight(600);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const EXTRA_BOLD: FontWeight = FontWeight(800);
    pub const BLACK: FontWeight = FontWeight(900);

    /// Clamp an arbitrary value into the 100-900 range.
    pub fn clamped(value: u16) -> Self {
        FontWeight(value.clamp(100, 900))
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::NORMAL
    }
}

impl From<FontWeight> for cosmic_text::Weight {
    fn from(weight: FontWeight) -> Self {
        cosmic_text::Weight(weight.0)
    }
}

/// Font width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl From<FontStretch> for cosmic_text::Stretch {
    fn from(stretch: FontStretch) -> Self {
        match stretch {
            FontStretch::UltraCondensed => cosmic_text::Stretch::UltraCondensed,
            FontStretch::ExtraCondensed => cosmic_text::Stretch::ExtraCondensed,
            FontStretch::Condensed => cosmic_text::Stretch::Condensed,
            FontStretch::SemiCondensed => cosmic_text::Stretch::SemiCondensed,
            FontStretch::Normal => cosmic_text::Stretch::Normal,
            FontStretch::SemiExpanded => cosmic_text::Stretch::SemiExpanded,
            FontStretch::Expanded => cosmic_text::Stretch::Expanded,
            FontStretch::ExtraExpanded => cosmic_text::Stretch::ExtraExpanded,
            FontStretch::UltraExpanded => cosmic_text::Stretch::UltraExpanded,
        }
    }
}

/// Image filter kinds carried on a paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterType {
    #[default]
    None,
    Blur,
    DropShadow,
    Brightness,
    Contrast,
    Grayscale,
    HueRotate,
    Invert,
    Opacity,
    Saturate,
    Sepia,
}

/// Hint for trading speed against quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderingHint {
    Speed,
    #[default]
    Quality,
    Antialias,
}

/// Expected update frequency of paint-attached resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryType {
    Static,
    #[default]
    Dynamic,
    Stream,
}

/// How a point list is interpreted by `draw_points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointMode {
    /// Each point is drawn on its own.
    #[default]
    Points,
    /// Consecutive pairs form independent segments.
    Lines,
    /// All points form one open polyline.
    Polygon,
}

/// Whether image sampling may read outside the source rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SrcRectConstraint {
    #[default]
    Strict,
    Fast,
}

/// Smoothing quality for image sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterQuality {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

impl From<FilterQuality> for tiny_skia::FilterQuality {
    fn from(quality: FilterQuality) -> Self {
        match quality {
            FilterQuality::Nearest => tiny_skia::FilterQuality::Nearest,
            FilterQuality::Bilinear => tiny_skia::FilterQuality::Bilinear,
            FilterQuality::Bicubic => tiny_skia::FilterQuality::Bicubic,
        }
    }
}
