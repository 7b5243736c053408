//! Geometry value types and parameter structs for drawing operations.
//!
//! All coordinates are `f64`. A [`Rect`] is stored as origin plus extent;
//! containment and intersection tests include the edges.

use crate::error::{CanvasError, CanvasResult};

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        kurbo::Point::new(p.x, p.y)
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Point::new(p.x, p.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// An axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corner points, normalized so the extent is positive.
    pub fn from_points(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The four corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left(), self.top()),
            Point::new(self.right(), self.top()),
            Point::new(self.right(), self.bottom()),
            Point::new(self.left(), self.bottom()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// True when `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Inclusive overlap test; rectangles sharing only an edge intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    /// Overlapping area, or `None` when the rectangles are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Grow (or shrink, for negative values) each edge outward.
    pub fn outset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(
            self.x - dx,
            self.y - dy,
            self.width + 2.0 * dx,
            self.height + 2.0 * dy,
        )
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Smallest rectangle with integer edges containing this one.
    pub fn round_out(&self) -> Rect {
        let left = self.left().floor();
        let top = self.top().floor();
        Rect::new(
            left,
            top,
            self.right().ceil() - left,
            self.bottom().ceil() - top,
        )
    }

    /// Bounding box of a set of points, `None` when empty.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub(crate) fn to_skia(self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }

    pub(crate) fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(self.left(), self.top(), self.right(), self.bottom())
    }
}

impl From<kurbo::Rect> for Rect {
    fn from(r: kurbo::Rect) -> Self {
        let r = r.abs();
        Rect::new(r.x0, r.y0, r.width(), r.height())
    }
}

/// An RGBA color with 8 bits per channel, not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Unpack a `0xRRGGBBAA` value.
    pub const fn from_rgba_u32(rgba: u32) -> Self {
        Self::rgba(
            (rgba >> 24) as u8,
            (rgba >> 16) as u8,
            (rgba >> 8) as u8,
            rgba as u8,
        )
    }

    pub const fn to_rgba_u32(self) -> u32 {
        ((self.r as u32) << 24) | ((self.g as u32) << 16) | ((self.b as u32) << 8) | self.a as u32
    }

    /// Parse any CSS color string (`"red"`, `"#f00"`, `"rgba(255,0,0,0.5)"`, ...).
    pub fn parse(s: &str) -> CanvasResult<Self> {
        let parsed = csscolorparser::parse(s)
            .map_err(|e| CanvasError::InvalidParameter(format!("color {s}: {e}")))?;
        let [r, g, b, a] = parsed.to_rgba8();
        Ok(Color::rgba(r, g, b, a))
    }

    /// Same color with alpha replaced.
    pub fn with_alpha(self, a: u8) -> Self {
        Color { a, ..self }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}

impl From<Color> for tiny_skia::Color {
    fn from(c: Color) -> Self {
        tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
    }
}

impl std::str::FromStr for Color {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

/// Parameters for an elliptical arc inscribed in an oval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcParams {
    /// Bounds of the ellipse the arc lies on.
    pub oval: Rect,
    /// Starting angle in radians, measured clockwise from the positive x axis.
    pub start_angle: f64,
    /// Sweep in radians; negative sweeps run counterclockwise.
    pub sweep_angle: f64,
    /// Close the arc through the oval center (a wedge).
    pub use_center: bool,
}

/// Parameters for a rounded rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundRectParams {
    pub rect: Rect,
    pub radius_x: f64,
    pub radius_y: f64,
}

/// Source and destination rectangles for drawing part of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRectParams {
    /// Region of the image in image pixel coordinates.
    pub src: Rect,
    /// Region of the canvas in user coordinates.
    pub dst: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_inclusive() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(!r.contains(Point::new(10.1, 5.0)));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(25.0, 25.0, 50.0, 50.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(25.0, 25.0, 25.0, 25.0)));

        let c = Rect::new(100.0, 100.0, 5.0, 5.0);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn test_rect_round_out() {
        let r = Rect::new(0.5, 1.2, 2.0, 2.0);
        assert_eq!(r.round_out(), Rect::new(0.0, 1.0, 3.0, 3.0));
    }

    #[test]
    fn test_rect_bounding() {
        let r = Rect::bounding([Point::new(3.0, 1.0), Point::new(-1.0, 4.0)]).unwrap();
        assert_eq!(r, Rect::new(-1.0, 1.0, 4.0, 3.0));
        assert!(Rect::bounding(std::iter::empty()).is_none());
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::parse("#ff0000").unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(Color::parse("blue").unwrap(), Color::rgb(0, 0, 255));
        assert!(Color::parse("not-a-color").is_err());
    }

    #[test]
    fn test_color_u32() {
        let c = Color::from_rgba_u32(0x11223344);
        assert_eq!(c, Color::rgba(0x11, 0x22, 0x33, 0x44));
        assert_eq!(c.to_rgba_u32(), 0x11223344);
        assert_eq!(Color::default(), Color::BLACK);
    }
}
