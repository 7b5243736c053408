//! Gradient paint sources.

use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{Color, Point};

/// A color stop in a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Offset position (0.0 to 1.0).
    pub offset: f64,
    /// Color at this stop.
    pub color: Color,
}

/// How a gradient continues outside its defined range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpreadMode {
    #[default]
    Pad,
    Repeat,
    Reflect,
}

impl From<SpreadMode> for tiny_skia::SpreadMode {
    fn from(mode: SpreadMode) -> Self {
        match mode {
            SpreadMode::Pad => tiny_skia::SpreadMode::Pad,
            SpreadMode::Repeat => tiny_skia::SpreadMode::Repeat,
            SpreadMode::Reflect => tiny_skia::SpreadMode::Reflect,
        }
    }
}

/// Type of gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientType {
    /// Linear gradient from `start` to `end`.
    Linear { start: Point, end: Point },
    /// Radial gradient from a focal point to a circle around `center`.
    Radial {
        focal: Point,
        center: Point,
        radius: f64,
    },
}

/// Linear or radial gradient, in the user space of the draw it is used with.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    /// Gradient type and geometry.
    pub gradient_type: GradientType,
    /// Color stops, sorted by offset.
    stops: Vec<GradientStop>,
    pub spread: SpreadMode,
}

impl Gradient {
    /// Create a new linear gradient.
    pub fn new_linear(start: Point, end: Point) -> Self {
        Self {
            gradient_type: GradientType::Linear { start, end },
            stops: Vec::new(),
            spread: SpreadMode::default(),
        }
    }

    /// Create a new radial gradient centered on `center`.
    pub fn new_radial(center: Point, radius: f64) -> Self {
        Self::new_two_point(center, center, radius)
    }

    /// Radial gradient whose focal point differs from the circle center.
    pub fn new_two_point(focal: Point, center: Point, radius: f64) -> Self {
        Self {
            gradient_type: GradientType::Radial {
                focal,
                center,
                radius,
            },
            stops: Vec::new(),
            spread: SpreadMode::default(),
        }
    }

    pub fn with_spread(mut self, spread: SpreadMode) -> Self {
        self.spread = spread;
        self
    }

    /// Add a color stop to the gradient.
    ///
    /// Stops stay sorted by offset; stops with equal offsets keep insertion order.
    pub fn add_color_stop(&mut self, offset: f64, color: Color) -> CanvasResult<()> {
        if !offset.is_finite() || !(0.0..=1.0).contains(&offset) {
            return Err(CanvasError::InvalidParameter(format!(
                "gradient stop offset {offset} (must be 0.0-1.0)"
            )));
        }
        self.stops.push(GradientStop { offset, color });
        self.stops.sort_by(|a, b| {
            a.offset
                .partial_cmp(&b.offset)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(())
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Color shown at `offset` ignoring spread, or `None` without stops.
    pub fn color_at(&self, offset: f64) -> Option<Color> {
        let first = self.stops.first()?;
        if offset <= first.offset {
            return Some(first.color);
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if offset <= b.offset {
                let span = b.offset - a.offset;
                let t = if span > 0.0 { (offset - a.offset) / span } else { 1.0 };
                let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
                return Some(Color::rgba(
                    lerp(a.color.r, b.color.r),
                    lerp(a.color.g, b.color.g),
                    lerp(a.color.b, b.color.b),
                    lerp(a.color.a, b.color.a),
                ));
            }
        }
        self.stops.last().map(|s| s.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_sorted() {
        let mut gradient = Gradient::new_linear(Point::ZERO, Point::new(10.0, 0.0));
        gradient.add_color_stop(1.0, Color::WHITE).unwrap();
        gradient.add_color_stop(0.0, Color::BLACK).unwrap();
        let offsets: Vec<f64> = gradient.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 1.0]);
    }

    #[test]
    fn test_invalid_stop() {
        let mut gradient = Gradient::new_radial(Point::ZERO, 5.0);
        assert!(gradient.add_color_stop(1.5, Color::WHITE).is_err());
        assert!(gradient.add_color_stop(f64::NAN, Color::WHITE).is_err());
        assert!(gradient.stops().is_empty());
    }

    #[test]
    fn test_color_at() {
        let mut gradient = Gradient::new_linear(Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(gradient.color_at(0.5), None);
        gradient.add_color_stop(0.0, Color::rgb(0, 0, 0)).unwrap();
        gradient.add_color_stop(1.0, Color::rgb(200, 100, 0)).unwrap();
        assert_eq!(gradient.color_at(0.5), Some(Color::rgb(100, 50, 0)));
        assert_eq!(gradient.color_at(2.0), Some(Color::rgb(200, 100, 0)));
    }
}
