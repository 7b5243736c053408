//! Transform operations for Canvas.

use super::Canvas;
use crate::geometry::Point;
use crate::matrix::Matrix;

impl Canvas {
    /// Post-multiply `op` onto the current matrix, ignoring non-finite input.
    fn apply(&mut self, op: Matrix) {
        if !op.is_finite() {
            log::debug!(target: "canvas", "ignoring non-finite transform {:?}", op);
            return;
        }
        self.state.matrix = self.state.matrix * op;
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        log::debug!(target: "canvas", "translate {} {}", dx, dy);
        self.apply(Matrix::translation(dx, dy));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        log::debug!(target: "canvas", "scale {} {}", sx, sy);
        self.apply(Matrix::scaling(sx, sy));
    }

    /// Rotate by `angle` radians about the user-space origin.
    pub fn rotate(&mut self, angle: f64) {
        log::debug!(target: "canvas", "rotate {}", angle);
        self.apply(Matrix::rotation(angle));
    }

    /// Rotate by `angle` radians about `center`, which stays fixed.
    ///
    /// Composes `T(center) * R * T(-center)`. The reversed order
    /// `T(-center) * R * T(center)` would pivot about `-center` instead.
    pub fn rotate_about(&mut self, angle: f64, center: Point) {
        log::debug!(target: "canvas", "rotate {} about {:?}", angle, center);
        let pivot = Matrix::translation(center.x, center.y)
            * Matrix::rotation(angle)
            * Matrix::translation(-center.x, -center.y);
        self.apply(pivot);
    }

    pub fn skew(&mut self, sx: f64, sy: f64) {
        log::debug!(target: "canvas", "skew {} {}", sx, sy);
        self.apply(Matrix::skewing(sx, sy));
    }

    /// Post-multiply an arbitrary matrix: `matrix` applies to geometry before
    /// the current transform.
    pub fn concat(&mut self, matrix: &Matrix) {
        log::debug!(target: "canvas", "concat {:?}", matrix);
        self.apply(*matrix);
    }

    /// Replace the current matrix.
    pub fn set_matrix(&mut self, matrix: Matrix) {
        log::debug!(target: "canvas", "set_matrix {:?}", matrix);
        if !matrix.is_finite() {
            return;
        }
        self.state.matrix = matrix;
    }

    pub fn reset_matrix(&mut self) {
        log::debug!(target: "canvas", "reset_matrix");
        self.state.matrix = Matrix::IDENTITY;
    }

    pub fn matrix(&self) -> Matrix {
        self.state.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use rstest::rstest;
    use std::f64::consts::FRAC_PI_2;

    fn assert_point_eq(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_translate_then_scale_scales_first() {
        let mut canvas = Canvas::new();
        canvas.translate(10.0, 10.0);
        canvas.scale(2.0, 2.0);
        assert_eq!(
            canvas.map_rect(&Rect::new(0.0, 0.0, 10.0, 10.0)),
            Rect::new(10.0, 10.0, 20.0, 20.0)
        );
    }

    #[test]
    fn test_scale_then_translate_scales_offset() {
        let mut canvas = Canvas::new();
        canvas.scale(2.0, 2.0);
        canvas.translate(10.0, 10.0);
        assert_point_eq(canvas.map_point(Point::ZERO), Point::new(20.0, 20.0));
    }

    #[rstest]
    #[case(10.0, -4.0)]
    #[case(0.125, 1e6)]
    #[case(-3.5, 0.0)]
    fn test_translate_inverse_restores_matrix(#[case] dx: f64, #[case] dy: f64) {
        let mut canvas = Canvas::new();
        canvas.rotate(0.3);
        canvas.scale(1.5, 0.5);
        let before = canvas.matrix();
        canvas.translate(dx, dy);
        canvas.translate(-dx, -dy);
        assert!(canvas.matrix().approx_eq(&before));
    }

    #[test]
    fn test_rotate_about_keeps_center_fixed() {
        let mut canvas = Canvas::new();
        let center = Point::new(50.0, 20.0);
        canvas.rotate_about(FRAC_PI_2, center);
        assert_point_eq(canvas.map_point(center), center);
        assert_point_eq(
            canvas.map_point(Point::new(60.0, 20.0)),
            Point::new(50.0, 30.0),
        );
    }

    #[test]
    fn test_skew_and_concat() {
        let mut canvas = Canvas::new();
        canvas.skew(1.0, 0.0);
        assert_point_eq(canvas.map_point(Point::new(0.0, 2.0)), Point::new(2.0, 2.0));
        canvas.concat(&Matrix::translation(1.0, 0.0));
        assert_point_eq(canvas.map_point(Point::new(0.0, 2.0)), Point::new(3.0, 2.0));
    }

    #[test]
    fn test_set_and_reset_matrix() {
        let mut canvas = Canvas::new();
        canvas.translate(5.0, 5.0);
        canvas.set_matrix(Matrix::scaling(3.0, 3.0));
        assert_eq!(canvas.matrix(), Matrix::scaling(3.0, 3.0));
        canvas.reset_matrix();
        assert_eq!(canvas.matrix(), Matrix::IDENTITY);
    }

    #[test]
    fn test_non_finite_input_ignored() {
        let mut canvas = Canvas::new();
        canvas.translate(f64::NAN, 1.0);
        canvas.scale(f64::INFINITY, 1.0);
        canvas.set_matrix(Matrix::translation(f64::NAN, 0.0));
        assert_eq!(canvas.matrix(), Matrix::IDENTITY);
    }
}
