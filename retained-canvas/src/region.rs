//! Device-space regions made of axis-aligned rectangles.

use crate::geometry::{Point, Rect};
use crate::path::Path;

/// A union of rectangles in device coordinates.
///
/// Rectangles may overlap; containment is the union of the parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Region::new();
        region.add_rect(rect);
        region
    }

    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Self {
        let mut region = Region::new();
        for rect in rects {
            region.add_rect(rect);
        }
        region
    }

    /// Union `rect` into the region. Empty rectangles are ignored.
    pub fn add_rect(&mut self, rect: Rect) {
        if rect.is_empty() || !rect.is_finite() {
            return;
        }
        if self.rects.iter().any(|r| r.contains_rect(&rect)) {
            return;
        }
        self.rects.retain(|r| !rect.contains_rect(r));
        self.rects.push(rect);
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// True when the region is exactly one rectangle.
    pub fn is_rect(&self) -> bool {
        self.rects.len() == 1
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|a, b| a.union(&b))
    }

    pub fn contains(&self, p: Point) -> bool {
        self.rects.iter().any(|r| r.contains(p))
    }

    pub fn intersects(&self, rect: &Rect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Region {
        Region {
            rects: self.rects.iter().map(|r| r.translate(dx, dy)).collect(),
        }
    }

    /// Path covering the region under the non-zero fill rule.
    pub fn to_path(&self) -> Path {
        let mut path = Path::new();
        for rect in &self.rects {
            path.add_rect(*rect);
        }
        path
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::from_rect(rect)
    }
}
