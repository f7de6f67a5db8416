//! rasterpix - Copy-on-write raster images for Rust
//!
//! rasterpix provides a 2D raster image container with:
//!
//! - Implicit sharing: clones are cheap, writes detach
//! - Nineteen pixel formats from 1-bit monochrome to premultiplied
//!   32-bit RGBA, with a dense conversion matrix between them
//! - Matrix-driven geometric transforms (rotation, mirroring, scaling,
//!   shear and perspective) producing minimal bounding images
//! - Palette-indexed images with adaptive quantization and ordered or
//!   error-diffusion dithering
//!
//! # Example
//!
//! ```
//! use rasterpix::{Image, PixelFormat, argb};
//! use rasterpix::transform::{Transform, TransformMode, transformed};
//!
//! let mut image = Image::new(64, 32, PixelFormat::Argb32).unwrap();
//! image.fill_color(argb::rgb(200, 60, 20));
//!
//! let rotated = transformed(&image, &Transform::from_rotate(90.0), TransformMode::Fast).unwrap();
//! assert_eq!(rotated.width(), 32);
//! assert_eq!(rotated.height(), 64);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use rasterpix_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use rasterpix_convert as convert;
pub use rasterpix_transform as transform;
