//! Error types for retained-canvas.

use thiserror::Error;

/// Result type alias using CanvasError.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas, surface and resource operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    /// An argument was out of range or malformed.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A pixel buffer or other resource could not be allocated.
    #[error("Out of memory")]
    OutOfMemory,

    /// The operation is undefined for the current values (singular matrix,
    /// zero homogeneous coordinate, finished surface).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Pixel layout or encoding the receiver cannot handle.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The backing device went away; no further work will complete.
    #[error("Device lost")]
    DeviceLost,

    /// A backend or encoder failed.
    #[error("Driver error: {0}")]
    DriverError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Fieldless mirror of [`CanvasError`] for matching on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidParameter,
    OutOfMemory,
    InvalidOperation,
    UnsupportedFormat,
    DeviceLost,
    DriverError,
    Unknown,
}

impl CanvasError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CanvasError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            CanvasError::OutOfMemory => ErrorKind::OutOfMemory,
            CanvasError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            CanvasError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            CanvasError::DeviceLost => ErrorKind::DeviceLost,
            CanvasError::DriverError(_) => ErrorKind::DriverError,
            CanvasError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

impl From<png::EncodingError> for CanvasError {
    fn from(err: png::EncodingError) -> Self {
        CanvasError::DriverError(format!("PNG encoding error: {err}"))
    }
}
