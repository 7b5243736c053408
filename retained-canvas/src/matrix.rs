//! 3x3 transformation matrix.
//!
//! The matrix is represented as:
//! ```text
//! | m11 m12 m13 |
//! | m21 m22 m23 |
//! | m31 m32 m33 |
//! ```
//! and acts on column vectors `(x, y, 1)`, so translation lives in `m13`/`m23`.
//!
//! Composition is the plain matrix product: `a * b` (or `a.concat(&b)`) maps a
//! point through `b` first and then through `a`. The canvas post-multiplies each
//! transform call onto its current matrix, so the most recent call applies to
//! geometry first.

use std::ops::Mul;

use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{Point, Rect};

/// Threshold below which a determinant counts as singular.
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// Threshold below which a homogeneous `w` counts as zero.
pub const W_EPSILON: f64 = 1e-12;

const NEARLY_EQUAL: f64 = 1e-9;

/// A 2D affine or projective transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub m11: f64,
    pub m12: f64,
    pub m13: f64,
    pub m21: f64,
    pub m22: f64,
    pub m23: f64,
    pub m31: f64,
    pub m32: f64,
    pub m33: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);

    /// Create a matrix from its nine coefficients in row-major order.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        m11: f64,
        m12: f64,
        m13: f64,
        m21: f64,
        m22: f64,
        m23: f64,
        m31: f64,
        m32: f64,
        m33: f64,
    ) -> Self {
        Self {
            m11,
            m12,
            m13,
            m21,
            m22,
            m23,
            m31,
            m32,
            m33,
        }
    }

    /// Create an affine matrix from canvas-style `(a, b, c, d, e, f)` coefficients.
    pub const fn from_affine(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self::new(a, c, e, b, d, f, 0.0, 0.0, 1.0)
    }

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    pub const fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0)
    }

    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation by `angle` radians. Positive angles turn +x toward +y.
    pub fn rotation(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
    }

    /// Shear with `x' = x + sx * y` and `y' = sy * x + y`.
    pub const fn skewing(sx: f64, sy: f64) -> Self {
        Self::new(1.0, sx, 0.0, sy, 1.0, 0.0, 0.0, 0.0, 1.0)
    }

    /// Matrix product `self × other`: `other` applies first.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        let a = self;
        let b = other;
        Matrix::new(
            a.m11 * b.m11 + a.m12 * b.m21 + a.m13 * b.m31,
            a.m11 * b.m12 + a.m12 * b.m22 + a.m13 * b.m32,
            a.m11 * b.m13 + a.m12 * b.m23 + a.m13 * b.m33,
            a.m21 * b.m11 + a.m22 * b.m21 + a.m23 * b.m31,
            a.m21 * b.m12 + a.m22 * b.m22 + a.m23 * b.m32,
            a.m21 * b.m13 + a.m22 * b.m23 + a.m23 * b.m33,
            a.m31 * b.m11 + a.m32 * b.m21 + a.m33 * b.m31,
            a.m31 * b.m12 + a.m32 * b.m22 + a.m33 * b.m32,
            a.m31 * b.m13 + a.m32 * b.m23 + a.m33 * b.m33,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.m11 * (self.m22 * self.m33 - self.m23 * self.m32)
            - self.m12 * (self.m21 * self.m33 - self.m23 * self.m31)
            + self.m13 * (self.m21 * self.m32 - self.m22 * self.m31)
    }

    /// Inverse matrix.
    ///
    /// Fails with [`CanvasError::InvalidOperation`] when the determinant is
    /// within [`SINGULAR_EPSILON`] of zero.
    pub fn invert(&self) -> CanvasResult<Matrix> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return Err(CanvasError::InvalidOperation(format!(
                "matrix is not invertible (determinant {det})"
            )));
        }
        let inv = 1.0 / det;
        Ok(Matrix::new(
            (self.m22 * self.m33 - self.m23 * self.m32) * inv,
            (self.m13 * self.m32 - self.m12 * self.m33) * inv,
            (self.m12 * self.m23 - self.m13 * self.m22) * inv,
            (self.m23 * self.m31 - self.m21 * self.m33) * inv,
            (self.m11 * self.m33 - self.m13 * self.m31) * inv,
            (self.m13 * self.m21 - self.m11 * self.m23) * inv,
            (self.m21 * self.m32 - self.m22 * self.m31) * inv,
            (self.m12 * self.m31 - self.m11 * self.m32) * inv,
            (self.m11 * self.m22 - self.m12 * self.m21) * inv,
        ))
    }

    /// Map a point, dividing by the homogeneous `w` component.
    ///
    /// A `w` within [`W_EPSILON`] of zero maps the point to infinity and is
    /// reported as [`CanvasError::InvalidOperation`].
    pub fn map_point(&self, p: Point) -> CanvasResult<Point> {
        let x = self.m11 * p.x + self.m12 * p.y + self.m13;
        let y = self.m21 * p.x + self.m22 * p.y + self.m23;
        let w = self.m31 * p.x + self.m32 * p.y + self.m33;
        if !w.is_finite() || w.abs() < W_EPSILON {
            return Err(CanvasError::InvalidOperation(format!(
                "point ({}, {}) maps to w = {w}",
                p.x, p.y
            )));
        }
        Ok(Point::new(x / w, y / w))
    }

    /// Axis-aligned bounding box of the four mapped corners.
    ///
    /// Under rotation or skew the result is larger than the mapped shape.
    pub fn map_rect(&self, r: &Rect) -> CanvasResult<Rect> {
        let corners = r.corners();
        let mut mapped = [Point::ZERO; 4];
        for (out, corner) in mapped.iter_mut().zip(corners) {
            *out = self.map_point(corner)?;
        }
        Ok(Rect::bounding(mapped).unwrap_or_default())
    }

    /// Map a vector, ignoring translation and perspective.
    pub fn map_vector(&self, dx: f64, dy: f64) -> Point {
        Point::new(
            self.m11 * dx + self.m12 * dy,
            self.m21 * dx + self.m22 * dy,
        )
    }

    pub fn is_identity(&self) -> bool {
        self.approx_eq(&Matrix::IDENTITY)
    }

    /// True when the bottom row is `(0, 0, 1)`.
    pub fn is_affine(&self) -> bool {
        self.m31 == 0.0 && self.m32 == 0.0 && self.m33 == 1.0
    }

    pub fn is_translate_only(&self) -> bool {
        self.is_affine()
            && self.m11 == 1.0
            && self.m22 == 1.0
            && self.m12 == 0.0
            && self.m21 == 0.0
    }

    /// True when axis-aligned rectangles map to axis-aligned rectangles.
    pub fn preserves_axis_alignment(&self) -> bool {
        self.is_affine() && self.m12 == 0.0 && self.m21 == 0.0
    }

    pub fn approx_eq(&self, other: &Matrix) -> bool {
        self.coefficients()
            .iter()
            .zip(other.coefficients().iter())
            .all(|(a, b)| (a - b).abs() <= NEARLY_EQUAL)
    }

    pub fn is_finite(&self) -> bool {
        self.coefficients().iter().all(|v| v.is_finite())
    }

    /// Coefficients in row-major order.
    pub fn coefficients(&self) -> [f64; 9] {
        [
            self.m11, self.m12, self.m13, self.m21, self.m22, self.m23, self.m31, self.m32,
            self.m33,
        ]
    }

    /// Length of the transformed x axis.
    pub fn scale_x(&self) -> f64 {
        self.m11.hypot(self.m21)
    }

    /// Length of the transformed y axis.
    pub fn scale_y(&self) -> f64 {
        self.m12.hypot(self.m22)
    }

    /// Angle of the transformed x axis in radians.
    pub fn rotation_angle(&self) -> f64 {
        self.m21.atan2(self.m11)
    }

    /// Raw horizontal shear coefficient (`m12`).
    pub fn skew_x(&self) -> f64 {
        self.m12
    }

    /// Raw vertical shear coefficient (`m21`).
    pub fn skew_y(&self) -> f64 {
        self.m21
    }

    pub fn translation_offset(&self) -> Point {
        Point::new(self.m13, self.m23)
    }

    pub fn is_scaled(&self) -> bool {
        (self.scale_x() - 1.0).abs() > NEARLY_EQUAL || (self.scale_y() - 1.0).abs() > NEARLY_EQUAL
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation_angle().abs() > NEARLY_EQUAL
    }

    /// True when the transformed axes are no longer perpendicular.
    pub fn is_skewed(&self) -> bool {
        (self.m11 * self.m12 + self.m21 * self.m22).abs() > NEARLY_EQUAL
    }

    /// Convert to a tiny-skia transform. Projective matrices have no equivalent.
    pub(crate) fn to_skia(&self) -> Option<tiny_skia::Transform> {
        if !self.is_affine() {
            return None;
        }
        Some(tiny_skia::Transform::from_row(
            self.m11 as f32,
            self.m21 as f32,
            self.m12 as f32,
            self.m22 as f32,
            self.m13 as f32,
            self.m23 as f32,
        ))
    }

    /// Convert to a kurbo affine. Projective matrices have no equivalent.
    pub(crate) fn to_kurbo(&self) -> Option<kurbo::Affine> {
        if !self.is_affine() {
            return None;
        }
        Some(kurbo::Affine::new([
            self.m11, self.m21, self.m12, self.m22, self.m13, self.m23,
        ]))
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        self.concat(&rhs)
    }
}

impl From<tiny_skia::Transform> for Matrix {
    fn from(t: tiny_skia::Transform) -> Self {
        Matrix::from_affine(
            t.sx as f64,
            t.ky as f64,
            t.kx as f64,
            t.sy as f64,
            t.tx as f64,
            t.ty as f64,
        )
    }
}
