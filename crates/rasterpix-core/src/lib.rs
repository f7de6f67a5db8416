//! rasterpix-core - The shared raster image container
//!
//! This crate provides the data structures at the heart of rasterpix:
//!
//! - [`Image`] - copy-on-write raster image handle
//! - [`PixelFormat`] / [`FormatInfo`] - the pixel format catalog
//! - [`PixelBuffer`] - the raw byte store (owned or borrowed)
//! - [`ColorTable`] - the palette of indexed images
//! - [`Rect`] / [`Point`] - geometry value types
//! - [`argb`] - 32-bit ARGB color helpers
//! - [`packed`] - packed pixel codecs shared with the conversion crate
//! - [`hooks`] - cache-invalidation hook registry
//! - [`codec`] - decoder/encoder collaborator traits
//!
//! # Sharing model
//!
//! Image data is reference counted; clones share the same buffer until
//! one of them is written through, at which point the writer detaches
//! onto a private deep copy. See the [`image`] module docs.

pub mod argb;
pub mod buffer;
pub mod codec;
pub mod color_table;
pub mod error;
pub mod format;
pub mod geom;
pub mod hooks;
pub mod image;
pub mod packed;

pub use buffer::{PixelBuffer, ReleaseFn};
pub use color_table::{ColorTable, MONO_TABLE};
pub use error::{Error, Result};
pub use format::{FormatInfo, N_FORMATS, PixelFormat};
pub use geom::{Point, Rect};
pub use image::{Image, InvertMode};
