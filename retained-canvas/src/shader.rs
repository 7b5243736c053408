//! Shaders: a color source plus its own local matrix.

use std::sync::Arc;

use crate::geometry::Color;
use crate::gradient::Gradient;
use crate::matrix::Matrix;
use crate::pattern::Pattern;

#[derive(Debug, Clone)]
pub enum ShaderKind {
    Solid(Color),
    Gradient(Arc<Gradient>),
    Pattern(Arc<Pattern>),
}

/// A reusable color source.
///
/// The local matrix maps shader space into the user space of the draw, before
/// the canvas matrix applies.
#[derive(Debug, Clone)]
pub struct Shader {
    pub kind: ShaderKind,
    pub local_matrix: Matrix,
}

impl Shader {
    pub fn solid(color: Color) -> Self {
        Self {
            kind: ShaderKind::Solid(color),
            local_matrix: Matrix::IDENTITY,
        }
    }

    pub fn gradient(gradient: Arc<Gradient>) -> Self {
        Self {
            kind: ShaderKind::Gradient(gradient),
            local_matrix: Matrix::IDENTITY,
        }
    }

    pub fn pattern(pattern: Arc<Pattern>) -> Self {
        Self {
            kind: ShaderKind::Pattern(pattern),
            local_matrix: Matrix::IDENTITY,
        }
    }

    pub fn with_local_matrix(mut self, matrix: Matrix) -> Self {
        self.local_matrix = matrix;
        self
    }
}
