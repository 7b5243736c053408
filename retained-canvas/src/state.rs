//! Canvas state that can be saved and restored.

use crate::clip::Clip;
use crate::matrix::Matrix;
use crate::paint::Paint;

/// Drawing state captured by `save` and reinstated by `restore`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasState {
    /// Current transform matrix, user space to device space.
    pub matrix: Matrix,
    /// Current clip in device space.
    pub clip: Clip,
    /// Paint used by the convenience draw calls that take no paint.
    pub paint: Paint,
    /// Pixels were submitted since the last completion request.
    pub dirty: bool,
    pub valid: bool,
    pub ready: bool,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            clip: Clip::unbounded(),
            paint: Paint::default(),
            dirty: false,
            valid: true,
            ready: true,
        }
    }
}

impl CanvasState {
    /// Baseline state with `paint` as the default paint.
    pub fn with_paint(paint: Paint) -> Self {
        Self {
            paint,
            ..Self::default()
        }
    }
}
