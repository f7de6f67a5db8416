//! Error types for rasterpix-convert

use rasterpix_core::PixelFormat;
use thiserror::Error;

/// Errors that can occur during format conversion
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] rasterpix_core::Error),

    /// No direct or pivoted path between two formats
    #[error("unsupported conversion: {from:?} -> {to:?}")]
    UnsupportedConversion { from: PixelFormat, to: PixelFormat },

    /// Invalid palette for a fixed-palette conversion
    #[error("invalid palette: {0}")]
    InvalidPalette(String),
}

/// Result type for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;
