//! Paint: the style attributes of a single draw call.
//!
//! A paint holds at most one active color source. Assigning a shader,
//! gradient, pattern or image replaces whatever source was active, and
//! assigning a plain color deactivates any shared source. Sources are held in
//! `Arc`s, so cloning a paint is cheap and aliases them.

use std::sync::Arc;

use crate::geometry::{Color, Point, Rect};
use crate::gradient::Gradient;
use crate::image::Image;
use crate::matrix::Matrix;
use crate::pattern::Pattern;
use crate::shader::Shader;
use crate::style::{
    AntialiasMode, BlendMode, FillRule, FilterQuality, FilterType, FontStretch, FontStyle,
    FontWeight, LineCap, LineJoin, MemoryType, PaintStyle, RenderingHint, TextAlign,
    TextBaseline, TextRenderingMode,
};

/// Default font family when none is configured.
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Default text size in pixels.
pub const DEFAULT_TEXT_SIZE: f64 = 12.0;

/// Shared color source replacing the paint's plain color.
#[derive(Debug, Clone)]
pub enum PaintSource {
    Shader(Arc<Shader>),
    Gradient(Arc<Gradient>),
    Pattern(Arc<Pattern>),
    Image(Arc<Image>),
}

impl PartialEq for PaintSource {
    /// Sources compare by identity, not content.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PaintSource::Shader(a), PaintSource::Shader(b)) => Arc::ptr_eq(a, b),
            (PaintSource::Gradient(a), PaintSource::Gradient(b)) => Arc::ptr_eq(a, b),
            (PaintSource::Pattern(a), PaintSource::Pattern(b)) => Arc::ptr_eq(a, b),
            (PaintSource::Image(a), PaintSource::Image(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The source a draw with this paint is colored by.
#[derive(Debug, Clone, Copy)]
pub enum ActiveSource<'a> {
    Color(Color),
    Shader(&'a Arc<Shader>),
    Gradient(&'a Arc<Gradient>),
    Pattern(&'a Arc<Pattern>),
    Image(&'a Arc<Image>),
}

/// Text attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub family: String,
    pub size: f64,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub stretch: FontStretch,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub rendering_mode: TextRenderingMode,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size: DEFAULT_TEXT_SIZE,
            weight: FontWeight::default(),
            style: FontStyle::default(),
            stretch: FontStretch::default(),
            align: TextAlign::default(),
            baseline: TextBaseline::default(),
            rendering_mode: TextRenderingMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub offset: Point,
    pub blur: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDash {
    /// Alternating on/off lengths.
    pub intervals: Vec<f64>,
    pub offset: f64,
}

impl StrokeDash {
    /// Dash with validated intervals.
    ///
    /// Returns `None` for an empty list or any negative or non-finite entry.
    /// Odd-length lists are repeated to make them even.
    pub fn new(intervals: &[f64], offset: f64) -> Option<Self> {
        if intervals.is_empty() || intervals.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return None;
        }
        if intervals.iter().all(|v| *v == 0.0) {
            return None;
        }
        let mut intervals = intervals.to_vec();
        if intervals.len() % 2 == 1 {
            intervals.extend_from_within(..);
        }
        Some(Self {
            intervals,
            offset: if offset.is_finite() { offset } else { 0.0 },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Filter {
    pub filter_type: FilterType,
    pub color: Color,
    pub blur: f64,
    pub offset: Point,
    /// Strength for the color-adjusting filters.
    pub amount: f64,
}

impl Filter {
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            color: Color::BLACK,
            blur: 0.0,
            offset: Point::ZERO,
            amount: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paint {
    style: PaintStyle,
    color: Color,
    source: Option<PaintSource>,
    stroke_width: f64,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f64,
    antialias: AntialiasMode,
    blend_mode: BlendMode,
    opacity: f64,
    fill_rule: FillRule,
    text: TextStyle,
    shadow: Option<Shadow>,
    dash: Option<StrokeDash>,
    filter: Option<Filter>,
    filter_quality: FilterQuality,
    transform: Matrix,
    clip_rect: Option<Rect>,
    rendering_hint: RenderingHint,
    memory_type: MemoryType,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            style: PaintStyle::Fill,
            color: Color::BLACK,
            source: None,
            stroke_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 4.0,
            antialias: AntialiasMode::High,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            fill_rule: FillRule::NonZero,
            text: TextStyle::default(),
            shadow: None,
            dash: None,
            filter: None,
            filter_quality: FilterQuality::default(),
            transform: Matrix::IDENTITY,
            clip_rect: None,
            rendering_hint: RenderingHint::Quality,
            memory_type: MemoryType::Dynamic,
        }
    }
}

impl PartialEq for Paint {
    fn eq(&self, other: &Self) -> bool {
        self.style == other.style
            && self.color == other.color
            && self.source == other.source
            && self.stroke_width == other.stroke_width
            && self.line_cap == other.line_cap
            && self.line_join == other.line_join
            && self.miter_limit == other.miter_limit
            && self.antialias == other.antialias
            && self.blend_mode == other.blend_mode
            && self.opacity == other.opacity
            && self.fill_rule == other.fill_rule
            && self.text == other.text
            && self.shadow == other.shadow
            && self.dash == other.dash
            && self.filter == other.filter
            && self.filter_quality == other.filter_quality
            && self.transform == other.transform
            && self.clip_rect == other.clip_rect
            && self.rendering_hint == other.rendering_hint
            && self.memory_type == other.memory_type
    }
}

impl Paint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solid fill with `color`.
    pub fn fill(color: Color) -> Self {
        Self::default().with_color(color)
    }

    /// Stroke with `color` and `width`.
    pub fn stroke(color: Color, width: f64) -> Self {
        let mut paint = Self::default().with_color(color).with_style(PaintStyle::Stroke);
        paint.set_stroke_width(width);
        paint
    }

    /// Restore every attribute to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.set_color(color);
        self
    }

    pub fn with_style(mut self, style: PaintStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_source(mut self, source: PaintSource) -> Self {
        self.set_source(source);
        self
    }

    // --- Color sources ---

    pub fn color(&self) -> Color {
        self.color
    }

    /// Make `color` the active source, deactivating any shared source.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.source = None;
    }

    /// Make `source` the active source, replacing the previous one.
    pub fn set_source(&mut self, source: PaintSource) {
        self.source = Some(source);
    }

    pub fn set_shader(&mut self, shader: Arc<Shader>) {
        self.set_source(PaintSource::Shader(shader));
    }

    pub fn set_gradient(&mut self, gradient: Arc<Gradient>) {
        self.set_source(PaintSource::Gradient(gradient));
    }

    pub fn set_pattern(&mut self, pattern: Arc<Pattern>) {
        self.set_source(PaintSource::Pattern(pattern));
    }

    pub fn set_image(&mut self, image: Arc<Image>) {
        self.set_source(PaintSource::Image(image));
    }

    /// Fall back to the plain color.
    pub fn clear_source(&mut self) {
        self.source = None;
    }

    pub fn source(&self) -> Option<&PaintSource> {
        self.source.as_ref()
    }

    pub fn active_source(&self) -> ActiveSource<'_> {
        match &self.source {
            None => ActiveSource::Color(self.color),
            Some(PaintSource::Shader(s)) => ActiveSource::Shader(s),
            Some(PaintSource::Gradient(g)) => ActiveSource::Gradient(g),
            Some(PaintSource::Pattern(p)) => ActiveSource::Pattern(p),
            Some(PaintSource::Image(i)) => ActiveSource::Image(i),
        }
    }

    pub fn shader(&self) -> Option<&Arc<Shader>> {
        match &self.source {
            Some(PaintSource::Shader(s)) => Some(s),
            _ => None,
        }
    }

    pub fn gradient(&self) -> Option<&Arc<Gradient>> {
        match &self.source {
            Some(PaintSource::Gradient(g)) => Some(g),
            _ => None,
        }
    }

    pub fn pattern(&self) -> Option<&Arc<Pattern>> {
        match &self.source {
            Some(PaintSource::Pattern(p)) => Some(p),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&Arc<Image>> {
        match &self.source {
            Some(PaintSource::Image(i)) => Some(i),
            _ => None,
        }
    }

    // --- Geometry style ---

    pub fn style(&self) -> PaintStyle {
        self.style
    }

    pub fn set_style(&mut self, style: PaintStyle) {
        self.style = style;
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    /// Set the stroke width. Negative or non-finite values are ignored; zero
    /// selects a hairline.
    pub fn set_stroke_width(&mut self, width: f64) {
        if width.is_finite() && width >= 0.0 {
            self.stroke_width = width;
        }
    }

    pub fn line_cap(&self) -> LineCap {
        self.line_cap
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.line_cap = cap;
    }

    pub fn line_join(&self) -> LineJoin {
        self.line_join
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.line_join = join;
    }

    pub fn miter_limit(&self) -> f64 {
        self.miter_limit
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        if limit.is_finite() && limit > 0.0 {
            self.miter_limit = limit;
        }
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }

    pub fn dash(&self) -> Option<&StrokeDash> {
        self.dash.as_ref()
    }

    pub fn set_dash(&mut self, dash: Option<StrokeDash>) {
        self.dash = dash;
    }

    // --- Compositing ---

    pub fn antialias(&self) -> AntialiasMode {
        self.antialias
    }

    pub fn set_antialias(&mut self, mode: AntialiasMode) {
        self.antialias = mode;
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Set the opacity, clamped to 0.0-1.0. Non-finite values are ignored.
    pub fn set_opacity(&mut self, opacity: f64) {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn shadow(&self) -> Option<&Shadow> {
        self.shadow.as_ref()
    }

    pub fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.shadow = shadow;
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn set_filter(&mut self, filter: Option<Filter>) {
        self.filter = filter.filter(|f| f.filter_type != FilterType::None);
    }

    pub fn filter_quality(&self) -> FilterQuality {
        self.filter_quality
    }

    pub fn set_filter_quality(&mut self, quality: FilterQuality) {
        self.filter_quality = quality;
    }

    // --- Text ---

    pub fn text(&self) -> &TextStyle {
        &self.text
    }

    pub fn set_text_style(&mut self, text: TextStyle) {
        self.text = text;
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.text.family = family.into();
    }

    pub fn text_size(&self) -> f64 {
        self.text.size
    }

    /// Set the text size in pixels. Non-positive or non-finite values are ignored.
    pub fn set_text_size(&mut self, size: f64) {
        if size.is_finite() && size > 0.0 {
            self.text.size = size;
        }
    }

    pub fn set_font_weight(&mut self, weight: FontWeight) {
        self.text.weight = weight;
    }

    pub fn set_font_style(&mut self, style: FontStyle) {
        self.text.style = style;
    }

    pub fn set_font_stretch(&mut self, stretch: FontStretch) {
        self.text.stretch = stretch;
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.text.align = align;
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.text.baseline = baseline;
    }

    pub fn set_text_rendering_mode(&mut self, mode: TextRenderingMode) {
        self.text.rendering_mode = mode;
    }

    // --- Auxiliary ---

    /// Extra transform applied to the geometry before the canvas matrix.
    pub fn transform(&self) -> Matrix {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Matrix) {
        if transform.is_finite() {
            self.transform = transform;
        }
    }

    /// Extra clip rectangle, in the user space of the draw.
    pub fn clip_rect(&self) -> Option<Rect> {
        self.clip_rect
    }

    pub fn set_clip_rect(&mut self, rect: Option<Rect>) {
        self.clip_rect = rect;
    }

    pub fn rendering_hint(&self) -> RenderingHint {
        self.rendering_hint
    }

    pub fn set_rendering_hint(&mut self, hint: RenderingHint) {
        self.rendering_hint = hint;
    }

    pub fn memory_type(&self) -> MemoryType {
        self.memory_type
    }

    pub fn set_memory_type(&mut self, memory_type: MemoryType) {
        self.memory_type = memory_type;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::Gradient;

    #[test]
    fn test_defaults() {
        let paint = Paint::default();
        assert_eq!(paint.style(), PaintStyle::Fill);
        assert_eq!(paint.color(), Color::BLACK);
        assert_eq!(paint.stroke_width(), 1.0);
        assert_eq!(paint.antialias(), AntialiasMode::High);
        assert_eq!(paint.blend_mode(), BlendMode::Normal);
        assert_eq!(paint.opacity(), 1.0);
        assert_eq!(paint.fill_rule(), FillRule::NonZero);
        assert_eq!(paint.text_size(), 12.0);
        assert!(paint.source().is_none());
    }

    #[test]
    fn test_reset() {
        let mut paint = Paint::stroke(Color::WHITE, 4.0).with_opacity(0.3);
        paint.set_text_size(30.0);
        paint.reset();
        assert_eq!(paint, Paint::default());
    }

    #[test]
    fn test_setting_source_replaces_previous() {
        let gradient = Arc::new(Gradient::new_linear(Point::ZERO, Point::new(1.0, 0.0)));
        let image = Arc::new(Image::filled(1, 1, Color::WHITE).unwrap());

        let mut paint = Paint::default();
        paint.set_gradient(Arc::clone(&gradient));
        paint.set_image(Arc::clone(&image));
        assert!(paint.gradient().is_none());
        assert!(matches!(paint.active_source(), ActiveSource::Image(_)));

        paint.set_color(Color::WHITE);
        assert!(paint.image().is_none());
        assert!(matches!(paint.active_source(), ActiveSource::Color(Color::WHITE)));
    }

    #[test]
    fn test_equality_uses_source_identity() {
        let a = Arc::new(Gradient::new_linear(Point::ZERO, Point::new(1.0, 0.0)));
        let b = Arc::new(Gradient::new_linear(Point::ZERO, Point::new(1.0, 0.0)));

        let mut p1 = Paint::default();
        p1.set_gradient(Arc::clone(&a));
        let mut p2 = Paint::default();
        p2.set_gradient(Arc::clone(&a));
        assert_eq!(p1, p2);

        p2.set_gradient(b);
        assert_ne!(p1, p2);
    }

    #[test]
    fn test_clone_aliases_sources() {
        let gradient = Arc::new(Gradient::new_linear(Point::ZERO, Point::new(1.0, 0.0)));
        let mut paint = Paint::default();
        paint.set_gradient(Arc::clone(&gradient));
        let copy = paint.clone();
        assert!(Arc::ptr_eq(copy.gradient().unwrap(), &gradient));
        assert_eq!(Arc::strong_count(&gradient), 3);
    }

    #[test]
    fn test_invalid_values_ignored() {
        let mut paint = Paint::default();
        paint.set_stroke_width(-1.0);
        paint.set_stroke_width(f64::NAN);
        paint.set_text_size(0.0);
        paint.set_opacity(f64::INFINITY);
        assert_eq!(paint.stroke_width(), 1.0);
        assert_eq!(paint.text_size(), 12.0);
        assert_eq!(paint.opacity(), 1.0);

        paint.set_opacity(2.0);
        assert_eq!(paint.opacity(), 1.0);
    }

    #[test]
    fn test_stroke_dash_normalized() {
        let dash = StrokeDash::new(&[5.0, 2.0, 1.0], 0.0).unwrap();
        assert_eq!(dash.intervals, vec![5.0, 2.0, 1.0, 5.0, 2.0, 1.0]);
        assert!(StrokeDash::new(&[], 0.0).is_none());
        assert!(StrokeDash::new(&[1.0, -1.0], 0.0).is_none());
    }
}
