//! rasterpix-transform - Geometric transformations
//!
//! This crate provides matrix-driven transformation of rasterpix
//! images:
//!
//! - [`Transform`] - 3x3 affine/perspective matrix with kind
//!   classification
//! - [`transformed`] - the general entry point returning the minimal
//!   bounding image, with fast paths for identity, mirrors, quarter
//!   turns and axis-aligned scales
//! - [`rotated_90`] / [`rotated_180`] / [`rotated_270`] /
//!   [`rotated_orth`] - exact quarter-turn rotations
//! - [`mirrored`] - horizontal/vertical reflection including
//!   bit-packed monochrome rows
//! - [`smooth_scaled`] / [`sample_scaled`] / [`scaled`] - the
//!   resampler and its nearest-neighbor counterpart

mod error;
mod matrix;
mod mirror;
mod rotate;
mod scale;
mod transformed;

pub use error::{TransformError, TransformResult};
pub use matrix::{Transform, TransformKind, true_matrix};
pub use mirror::mirrored;
pub use rotate::{rotated_90, rotated_180, rotated_270, rotated_orth};
pub use scale::{sample_scaled, scaled, smooth_scaled};
pub use transformed::{TransformMode, transformed};
