//! Error types for rasterpix-transform

use thiserror::Error;

/// Errors that can occur during geometric transformations
#[derive(Debug, Error)]
pub enum TransformError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] rasterpix_core::Error),

    /// Format conversion error on a promotion or resampling path
    #[error("conversion error: {0}")]
    Convert(#[from] rasterpix_convert::ConvertError),

    /// Singular matrix (non-invertible)
    #[error("singular transformation matrix")]
    SingularMatrix,

    /// Invalid transformation parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
