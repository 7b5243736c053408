//! Vector paths with a fill rule.
//!
//! Geometry is stored as a [`kurbo::BezPath`]. Containment honours the fill
//! rule and treats every subpath as implicitly closed, matching how a fill
//! would rasterize it.

use kurbo::{BezPath, PathEl, Shape};

use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{ArcParams, Point, Rect, RoundRectParams};
use crate::matrix::Matrix;
use crate::style::FillRule;

/// Flattening tolerance for containment tests and projective transforms.
const FLATTEN_TOLERANCE: f64 = 0.05;

/// Bezier approximation constant for a quarter ellipse.
const K: f64 = 0.552_284_8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    inner: BezPath,
    fill_rule: FillRule,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill_rule(fill_rule: FillRule) -> Self {
        Self {
            inner: BezPath::new(),
            fill_rule,
        }
    }

    pub fn from_bez_path(inner: BezPath) -> Self {
        Self {
            inner,
            fill_rule: FillRule::default(),
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut path = Path::new();
        path.add_rect(rect);
        path
    }

    /// Create a path from SVG path data.
    ///
    /// Relative commands, shorthands and elliptical arcs are normalized to
    /// absolute lines and curves.
    pub fn from_svg_path_data(path_data: &str) -> CanvasResult<Self> {
        let mut path = Path::new();

        for segment in svgtypes::SimplifyingPathParser::from(path_data) {
            let segment = segment.map_err(|e| {
                CanvasError::InvalidParameter(format!("Invalid SVG path data: {:?}", e))
            })?;

            match segment {
                svgtypes::SimplePathSegment::MoveTo { x, y } => path.move_to(x, y),
                svgtypes::SimplePathSegment::LineTo { x, y } => path.line_to(x, y),
                svgtypes::SimplePathSegment::Quadratic { x1, y1, x, y } => {
                    path.quad_to(x1, y1, x, y)
                }
                svgtypes::SimplePathSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => path.cubic_to(x1, y1, x2, y2, x, y),
                svgtypes::SimplePathSegment::ClosePath => path.close(),
            }
        }

        Ok(path)
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.fill_rule = fill_rule;
    }

    pub fn elements(&self) -> &[PathEl] {
        self.inner.elements()
    }

    pub fn as_bez_path(&self) -> &BezPath {
        &self.inner
    }

    /// True when the path has no drawing segments.
    pub fn is_empty(&self) -> bool {
        !self
            .inner
            .elements()
            .iter()
            .any(|el| !matches!(el, PathEl::MoveTo(_) | PathEl::ClosePath))
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.inner.move_to((x, y));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.inner.elements().is_empty() {
            self.inner.move_to((x, y));
        } else {
            self.inner.line_to((x, y));
        }
    }

    pub fn quad_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.ensure_start(cpx, cpy);
        self.inner.quad_to((cpx, cpy), (x, y));
    }

    pub fn cubic_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.ensure_start(cp1x, cp1y);
        self.inner.curve_to((cp1x, cp1y), (cp2x, cp2y), (x, y));
    }

    pub fn close(&mut self) {
        if !self.inner.elements().is_empty() {
            self.inner.close_path();
        }
    }

    fn ensure_start(&mut self, x: f64, y: f64) {
        if self.inner.elements().is_empty() {
            self.inner.move_to((x, y));
        }
    }

    /// Add a closed clockwise rectangle subpath.
    pub fn add_rect(&mut self, rect: Rect) {
        self.inner.move_to((rect.left(), rect.top()));
        self.inner.line_to((rect.right(), rect.top()));
        self.inner.line_to((rect.right(), rect.bottom()));
        self.inner.line_to((rect.left(), rect.bottom()));
        self.inner.close_path();
    }

    /// Add a rounded rectangle with elliptical corners.
    ///
    /// Radii are clamped to half the rectangle's extent; zero radii produce a
    /// plain rectangle.
    pub fn add_round_rect(&mut self, params: &RoundRectParams) {
        let rect = Rect::from_points(
            params.rect.origin(),
            Point::new(params.rect.right(), params.rect.bottom()),
        );
        let rx = params.radius_x.max(0.0).min(rect.width / 2.0);
        let ry = params.radius_y.max(0.0).min(rect.height / 2.0);
        if rx <= 0.0 || ry <= 0.0 {
            self.add_rect(rect);
            return;
        }

        let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
        let (kx, ky) = (rx * K, ry * K);

        self.inner.move_to((l + rx, t));
        self.inner.line_to((r - rx, t));
        self.inner
            .curve_to((r - rx + kx, t), (r, t + ry - ky), (r, t + ry));
        self.inner.line_to((r, b - ry));
        self.inner
            .curve_to((r, b - ry + ky), (r - rx + kx, b), (r - rx, b));
        self.inner.line_to((l + rx, b));
        self.inner
            .curve_to((l + rx - kx, b), (l, b - ry + ky), (l, b - ry));
        self.inner.line_to((l, t + ry));
        self.inner
            .curve_to((l, t + ry - ky), (l + rx - kx, t), (l + rx, t));
        self.inner.close_path();
    }

    /// Add an ellipse inscribed in `rect`.
    pub fn add_oval(&mut self, rect: Rect) {
        let ellipse = kurbo::Ellipse::from_rect(rect.to_kurbo());
        self.inner.extend(ellipse.path_elements(0.1));
    }

    pub fn add_circle(&mut self, center: Point, radius: f64) {
        let radius = radius.abs();
        self.add_oval(Rect::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        ));
    }

    /// Add an elliptical arc. With `use_center` the arc becomes a closed wedge.
    pub fn add_arc(&mut self, params: &ArcParams) {
        let oval = params.oval;
        let center = oval.center();
        let radii = kurbo::Vec2::new(oval.width.abs() / 2.0, oval.height.abs() / 2.0);
        let start = Point::new(
            center.x + radii.x * params.start_angle.cos(),
            center.y + radii.y * params.start_angle.sin(),
        );

        if params.use_center {
            self.inner.move_to((center.x, center.y));
            self.inner.line_to((start.x, start.y));
        } else {
            self.inner.move_to((start.x, start.y));
        }

        let arc = kurbo::Arc {
            center: kurbo::Point::new(center.x, center.y),
            radii,
            start_angle: params.start_angle,
            sweep_angle: params.sweep_angle,
            x_rotation: 0.0,
        };
        arc.to_cubic_beziers(0.1, |p1, p2, p| {
            self.inner.curve_to(p1, p2, p);
        });

        if params.use_center {
            self.inner.close_path();
        }
    }

    /// Add a polyline through `points`, optionally closed.
    pub fn add_polygon(&mut self, points: &[Point], close: bool) {
        let mut iter = points.iter();
        let Some(first) = iter.next() else {
            return;
        };
        self.inner.move_to((first.x, first.y));
        for p in iter {
            self.inner.line_to((p.x, p.y));
        }
        if close {
            self.inner.close_path();
        }
    }

    /// Append all subpaths of `other`.
    pub fn add_path(&mut self, other: &Path) {
        self.inner.extend(other.inner.elements().iter().copied());
    }

    /// Tight bounds of the path geometry, `None` when the path is empty.
    pub fn bounds(&self) -> Option<Rect> {
        if self.inner.elements().is_empty() {
            return None;
        }
        Some(Rect::from(self.inner.bounding_box()))
    }

    /// Winding number of `p` with every subpath implicitly closed.
    pub fn winding(&self, p: Point) -> i32 {
        let mut winding = 0;
        let mut start: Option<kurbo::Point> = None;
        let mut last: Option<kurbo::Point> = None;

        let edge = |a: kurbo::Point, b: kurbo::Point, winding: &mut i32| {
            if a.y <= p.y {
                if b.y > p.y && cross(a, b, p) > 0.0 {
                    *winding += 1;
                }
            } else if b.y <= p.y && cross(a, b, p) < 0.0 {
                *winding -= 1;
            }
        };

        kurbo::flatten(self.inner.iter(), FLATTEN_TOLERANCE, |el| match el {
            PathEl::MoveTo(pt) => {
                if let (Some(s), Some(l)) = (start, last) {
                    edge(l, s, &mut winding);
                }
                start = Some(pt);
                last = Some(pt);
            }
            PathEl::LineTo(pt) => {
                if let Some(l) = last {
                    edge(l, pt, &mut winding);
                }
                last = Some(pt);
            }
            PathEl::ClosePath => {
                if let (Some(s), Some(l)) = (start, last) {
                    edge(l, s, &mut winding);
                }
                last = start;
            }
            // flatten only emits the three variants above
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        });

        if let (Some(s), Some(l)) = (start, last) {
            edge(l, s, &mut winding);
        }

        winding
    }

    /// Point containment under the path's fill rule.
    pub fn contains(&self, p: Point) -> bool {
        if !self.bounds().is_some_and(|b| b.contains(p)) {
            return false;
        }
        self.fill_rule.is_inside(self.winding(p))
    }

    /// Copy of this path mapped through `matrix`.
    ///
    /// Affine matrices map control points exactly. Projective matrices flatten
    /// the path first and fail if any point lands at infinity.
    pub fn transformed(&self, matrix: &Matrix) -> CanvasResult<Path> {
        if let Some(affine) = matrix.to_kurbo() {
            let mut inner = self.inner.clone();
            inner.apply_affine(affine);
            return Ok(Path {
                inner,
                fill_rule: self.fill_rule,
            });
        }

        let mut out = BezPath::new();
        let mut failure = None;
        let mut map = |pt: kurbo::Point| -> kurbo::Point {
            match matrix.map_point(pt.into()) {
                Ok(mapped) => mapped.into(),
                Err(err) => {
                    failure.get_or_insert(err);
                    pt
                }
            }
        };
        kurbo::flatten(self.inner.iter(), FLATTEN_TOLERANCE, |el| match el {
            PathEl::MoveTo(pt) => out.move_to(map(pt)),
            PathEl::LineTo(pt) => out.line_to(map(pt)),
            PathEl::ClosePath => out.close_path(),
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(Path {
                inner: out,
                fill_rule: self.fill_rule,
            }),
        }
    }

    /// Convert to a tiny-skia path. Returns `None` for empty paths.
    pub(crate) fn to_skia(&self) -> Option<tiny_skia::Path> {
        let mut pb = tiny_skia::PathBuilder::new();
        for el in self.inner.elements() {
            match *el {
                PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
                PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
                PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
                PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    p.x as f32,
                    p.y as f32,
                ),
                PathEl::ClosePath => pb.close(),
            }
        }
        pb.finish()
    }
}

/// One flattened piece of a measured contour.
#[derive(Debug, Clone, Copy)]
struct MeasuredSegment {
    from: kurbo::Point,
    to: kurbo::Point,
    /// Distance along the contour where this segment starts.
    start: f64,
    length: f64,
}

/// Arc-length lookup over the first contour of a path.
///
/// Curves are flattened, so positions are exact only to the flattening
/// tolerance. A closed contour includes its closing edge.
#[derive(Debug, Clone, Default)]
pub struct PathMeasure {
    segments: Vec<MeasuredSegment>,
    length: f64,
}

impl PathMeasure {
    pub fn new(path: &Path) -> Self {
        let mut measure = Self::default();
        let mut start: Option<kurbo::Point> = None;
        let mut last: Option<kurbo::Point> = None;
        let mut done = false;
        kurbo::flatten(path.inner.iter(), FLATTEN_TOLERANCE, |el| {
            if done {
                return;
            }
            match el {
                PathEl::MoveTo(pt) => {
                    if !measure.segments.is_empty() {
                        done = true;
                        return;
                    }
                    start = Some(pt);
                    last = Some(pt);
                }
                PathEl::LineTo(pt) => {
                    if let Some(from) = last {
                        measure.push(from, pt);
                    }
                    last = Some(pt);
                }
                PathEl::ClosePath => {
                    if let (Some(from), Some(to)) = (last, start) {
                        measure.push(from, to);
                    }
                    last = start;
                    done = !measure.segments.is_empty();
                }
                PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
            }
        });
        measure
    }

    fn push(&mut self, from: kurbo::Point, to: kurbo::Point) {
        let length = from.distance(to);
        if length > 0.0 {
            self.segments.push(MeasuredSegment {
                from,
                to,
                start: self.length,
                length,
            });
            self.length += length;
        }
    }

    /// Total length of the measured contour.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Point at `distance` along the contour and the tangent angle there in
    /// radians. `None` when `distance` lies outside `0..=length`.
    pub fn position_and_tangent(&self, distance: f64) -> Option<(Point, f64)> {
        if !(0.0..=self.length).contains(&distance) {
            return None;
        }
        let index = self
            .segments
            .partition_point(|seg| seg.start + seg.length < distance);
        let seg = self.segments.get(index).or(self.segments.last())?;
        let t = ((distance - seg.start) / seg.length).clamp(0.0, 1.0);
        let position = seg.from.lerp(seg.to, t);
        let angle = (seg.to.y - seg.from.y).atan2(seg.to.x - seg.from.x);
        Some((position.into(), angle))
    }
}

/// Signed area of the triangle `(a, b, p)`; positive when `p` is left of `a -> b`.
fn cross(a: kurbo::Point, b: kurbo::Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}
