//! Image pattern paint sources.

use std::sync::Arc;

use crate::error::CanvasError;
use crate::image::Image;
use crate::matrix::Matrix;

/// Axes along which a pattern tiles. Parsed from the CSS keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Repetition {
    #[default]
    Repeat,
    RepeatX,
    RepeatY,
    /// One copy at the pattern origin.
    NoRepeat,
}

impl std::str::FromStr for Repetition {
    type Err = CanvasError;

    /// An empty string means `repeat`.
    fn from_str(keyword: &str) -> Result<Self, Self::Err> {
        let repetition = match keyword {
            "" | "repeat" => Repetition::Repeat,
            "repeat-x" => Repetition::RepeatX,
            "repeat-y" => Repetition::RepeatY,
            "no-repeat" => Repetition::NoRepeat,
            other => {
                return Err(CanvasError::InvalidParameter(format!(
                    "unknown pattern repetition {other:?}"
                )))
            }
        };
        Ok(repetition)
    }
}

impl Repetition {
    pub fn repeats_x(self) -> bool {
        matches!(self, Repetition::Repeat | Repetition::RepeatX)
    }

    pub fn repeats_y(self) -> bool {
        matches!(self, Repetition::Repeat | Repetition::RepeatY)
    }
}

/// An image tiled across the fill area.
#[derive(Debug, Clone)]
pub struct Pattern {
    image: Arc<Image>,
    repetition: Repetition,
    /// Maps pattern space into the user space of the draw.
    transform: Matrix,
}

impl Pattern {
    pub fn new(image: Arc<Image>, repetition: Repetition) -> Self {
        Self {
            image,
            repetition,
            transform: Matrix::IDENTITY,
        }
    }

    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.transform = transform;
        self
    }

    pub fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }

    pub fn transform(&self) -> Matrix {
        self.transform
    }

    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }

    pub fn repetition(&self) -> Repetition {
        self.repetition
    }

    /// Size of one tile in pattern space.
    pub fn tile_size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}
