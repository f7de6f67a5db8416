//! Error types for rasterpix-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Fallible constructors and converters return `Result`; most setters
//! instead log a diagnostic and return without effect, and every
//! operation on a null image is a total no-op.

use thiserror::Error;

/// rasterpix-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: i32, height: i32 },

    /// Invalid or unusable pixel format
    #[error("invalid pixel format")]
    InvalidFormat,

    /// Image size arithmetic overflowed the 32-bit byte-count limit
    #[error("image too large: {width}x{height} at {depth} bpp")]
    TooLarge { width: i32, height: i32, depth: u32 },

    /// Caller-supplied stride is too small for the row
    #[error("stride {stride} too small: row needs {min} bytes")]
    StrideTooSmall { stride: i32, min: i32 },

    /// Memory allocation failed
    #[error("memory allocation failed")]
    AllocationFailed,

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The image is attached to an active paint context
    #[error("paint context active: image data cannot be modified")]
    PaintDeviceBusy,

    /// I/O error (codec collaborators only)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rasterpix operations
pub type Result<T> = std::result::Result<T, Error>;
