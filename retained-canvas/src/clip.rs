//! Clip model.
//!
//! A [`Clip`] is the set of device pixels a draw may touch. It is kept as an
//! optional bounding rectangle refined by a list of shape elements, each either
//! intersected with or subtracted from what came before. Every intersecting
//! operation tightens the bounding rectangle, so the clip never grows.
//!
//! A clip with no bounding rectangle and no elements is *unbounded*: nothing is
//! excluded. An empty clip excludes everything.

use crate::geometry::{Point, Rect};
use crate::path::Path;
use crate::region::Region;

/// Which representation backs the live clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClipKind {
    /// A single axis-aligned rectangle (or unbounded).
    #[default]
    Rect,
    /// A rectangle refined by one or more intersected paths.
    Path,
    /// A region produced by region clips or by subtraction; may contain holes.
    Region,
}

/// How a clip element combines with the clip before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClipOp {
    #[default]
    Intersect,
    Difference,
}

/// A device-space clip shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipShape {
    Rect(Rect),
    Path(Path),
}

impl ClipShape {
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            ClipShape::Rect(rect) => Some(*rect),
            ClipShape::Path(path) => path.bounds(),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        match self {
            ClipShape::Rect(rect) => rect.contains(p),
            ClipShape::Path(path) => path.contains(p),
        }
    }

    pub fn to_path(&self) -> Path {
        match self {
            ClipShape::Rect(rect) => Path::from_rect(*rect),
            ClipShape::Path(path) => path.clone(),
        }
    }
}

/// One step of clip composition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipElement {
    pub shape: ClipShape,
    pub op: ClipOp,
    /// Rasterization hint for the clip edge; does not change set membership.
    pub anti_alias: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clip {
    bound: Option<Rect>,
    elements: Vec<ClipElement>,
    kind: ClipKind,
    empty: bool,
    anti_alias: bool,
}

impl Clip {
    /// A clip that excludes nothing.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut clip = Clip::unbounded();
        clip.intersect_rect(rect, false);
        clip
    }

    /// Intersect with a device-space rectangle.
    pub fn intersect_rect(&mut self, rect: Rect, anti_alias: bool) {
        if self.empty {
            return;
        }
        self.tighten(Some(rect));
        self.anti_alias |= anti_alias;
    }

    /// Intersect with a device-space path, honouring its fill rule.
    pub fn intersect_path(&mut self, path: Path, anti_alias: bool) {
        if self.empty {
            return;
        }
        let bounds = path.bounds();
        if bounds.is_none() || path.is_empty() {
            self.set_empty();
            return;
        }
        self.tighten(bounds);
        if self.empty {
            return;
        }
        self.upgrade(ClipKind::Path);
        self.elements.push(ClipElement {
            shape: ClipShape::Path(path),
            op: ClipOp::Intersect,
            anti_alias,
        });
    }

    /// Intersect with a device-space region.
    pub fn intersect_region(&mut self, region: &Region) {
        if self.empty {
            return;
        }
        match region.rects() {
            [] => self.set_empty(),
            [rect] => {
                self.intersect_rect(*rect, false);
                self.upgrade(ClipKind::Region);
            }
            _ => {
                self.tighten(region.bounds());
                if self.empty {
                    return;
                }
                self.upgrade(ClipKind::Region);
                self.elements.push(ClipElement {
                    shape: ClipShape::Path(region.to_path()),
                    op: ClipOp::Intersect,
                    anti_alias: false,
                });
            }
        }
    }

    /// Remove a device-space rectangle from the clip.
    pub fn subtract_rect(&mut self, rect: Rect, anti_alias: bool) {
        if self.empty || rect.is_empty() {
            return;
        }
        self.upgrade(ClipKind::Region);
        if let Some(bound) = self.bound {
            if rect.contains_rect(&bound) {
                self.set_empty();
                return;
            }
            if !rect.intersects(&bound) {
                return;
            }
        }
        self.elements.push(ClipElement {
            shape: ClipShape::Rect(rect),
            op: ClipOp::Difference,
            anti_alias,
        });
    }

    /// Remove a device-space path from the clip.
    pub fn subtract_path(&mut self, path: Path, anti_alias: bool) {
        if self.empty || path.is_empty() {
            return;
        }
        self.upgrade(ClipKind::Region);
        if let (Some(bound), Some(path_bounds)) = (self.bound, path.bounds()) {
            if !path_bounds.intersects(&bound) {
                return;
            }
        }
        self.elements.push(ClipElement {
            shape: ClipShape::Path(path),
            op: ClipOp::Difference,
            anti_alias,
        });
    }

    /// Remove a device-space region from the clip.
    pub fn subtract_region(&mut self, region: &Region) {
        for rect in region.rects() {
            self.subtract_rect(*rect, false);
        }
        self.upgrade(ClipKind::Region);
    }

    fn tighten(&mut self, rect: Option<Rect>) {
        let Some(rect) = rect else {
            return;
        };
        let next = match self.bound {
            Some(bound) => bound.intersection(&rect),
            None => Some(rect),
        };
        match next {
            Some(bound) if !bound.is_empty() && !self.hole_covers(&bound) => {
                self.bound = Some(bound)
            }
            _ => self.set_empty(),
        }
    }

    /// Whether a subtracted rectangle already removes all of `bound`.
    fn hole_covers(&self, bound: &Rect) -> bool {
        self.elements.iter().any(|e| {
            e.op == ClipOp::Difference
                && matches!(e.shape, ClipShape::Rect(hole) if hole.contains_rect(bound))
        })
    }

    fn upgrade(&mut self, kind: ClipKind) {
        self.kind = match (self.kind, kind) {
            (ClipKind::Region, _) | (_, ClipKind::Region) => ClipKind::Region,
            (ClipKind::Path, _) | (_, ClipKind::Path) => ClipKind::Path,
            _ => ClipKind::Rect,
        };
    }

    fn set_empty(&mut self) {
        self.empty = true;
        self.elements.clear();
        let origin = self.bound.map(|b| b.origin()).unwrap_or_default();
        self.bound = Some(Rect::new(origin.x, origin.y, 0.0, 0.0));
    }

    /// True when no pixel is eligible for drawing.
    ///
    /// Exact for rectangles and rectangular holes. Holes cut by paths or by
    /// several rectangles together are not checked, so such a clip may
    /// report `false` and still mask every pixel.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// True when no clip operation has restricted drawing.
    pub fn is_unbounded(&self) -> bool {
        !self.empty && self.bound.is_none() && self.elements.is_empty()
    }

    /// Whether the bounding rectangle edge was requested antialiased.
    pub fn is_anti_aliased(&self) -> bool {
        self.anti_alias
    }

    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    pub fn is_rect(&self) -> bool {
        self.kind == ClipKind::Rect
    }

    pub fn is_path(&self) -> bool {
        self.kind == ClipKind::Path
    }

    pub fn is_region(&self) -> bool {
        self.kind == ClipKind::Region
    }

    /// True when any subtraction contributed to the clip.
    pub fn is_clip_out(&self) -> bool {
        self.elements.iter().any(|e| e.op == ClipOp::Difference)
    }

    /// Bounding rectangle, or `None` when unbounded.
    ///
    /// Subtractions never shrink the bounds, so the result may be larger than
    /// the clip itself.
    pub fn bounds(&self) -> Option<Rect> {
        self.bound
    }

    pub fn elements(&self) -> &[ClipElement] {
        &self.elements
    }

    /// Device-space point containment.
    pub fn contains(&self, p: Point) -> bool {
        if self.empty {
            return false;
        }
        if let Some(bound) = self.bound {
            if !bound.contains(p) {
                return false;
            }
        }
        self.elements.iter().all(|e| match e.op {
            ClipOp::Intersect => e.shape.contains(p),
            ClipOp::Difference => !e.shape.contains(p),
        })
    }

    /// Conservative test that all of `rect` is inside the clip.
    ///
    /// Path elements are sampled at the rectangle's corners and center.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        if self.empty {
            return false;
        }
        if let Some(bound) = self.bound {
            if !bound.contains_rect(rect) {
                return false;
            }
        }
        let samples = [
            rect.corners()[0],
            rect.corners()[1],
            rect.corners()[2],
            rect.corners()[3],
            rect.center(),
        ];
        self.elements.iter().all(|e| match (e.op, &e.shape) {
            (ClipOp::Intersect, ClipShape::Rect(r)) => r.contains_rect(rect),
            (ClipOp::Intersect, ClipShape::Path(path)) => samples.iter().all(|p| path.contains(*p)),
            (ClipOp::Difference, shape) => shape
                .bounds()
                .map_or(true, |b| b.intersection(rect).map_or(true, |i| i.is_empty())),
        })
    }

    /// Whether `rect` may overlap the clip.
    ///
    /// Exact for rectangle-only clips; path elements are tested by bounds.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        if self.empty {
            return false;
        }
        if let Some(bound) = self.bound {
            if !bound.intersects(rect) {
                return false;
            }
        }
        self.elements.iter().all(|e| match (e.op, &e.shape) {
            (ClipOp::Intersect, shape) => shape.bounds().is_some_and(|b| b.intersects(rect)),
            (ClipOp::Difference, ClipShape::Rect(r)) => !r.contains_rect(rect),
            (ClipOp::Difference, ClipShape::Path(_)) => true,
        })
    }
}
