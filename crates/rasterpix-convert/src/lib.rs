//! rasterpix-convert - Pixel format conversion
//!
//! This crate provides conversions between every [`PixelFormat`]:
//!
//! - A dense dispatch table with an `Argb32` pivot fallback
//!   ([`convert_to_format`], [`convert_in_place`])
//! - Fixed-palette conversion by Manhattan-nearest match
//!   ([`convert_with_palette`])
//! - Monochrome dithering ([`dither_to_mono`]) and adaptive 32-to-8-bit
//!   quantization with the 6x6x6 color cube
//! - Mask extraction ([`create_alpha_mask`], [`create_mask_from_color`])
//! - Channel swaps ([`rgb_swapped`])
//!
//! Dithering behavior is selected via [`ConversionFlags`].

mod direct;
mod dispatch;
mod dither;
mod error;
mod flags;
mod indexed;
mod mask;
mod quantize;

pub use direct::rgb_swapped;
pub use dispatch::{ConvertFn, InPlaceFn, convert_in_place, convert_to_format};
pub use dither::{BAYER_MATRIX, BITFLIP, dither_to_mono};
pub use error::{ConvertError, ConvertResult};
pub use flags::{AlphaDitherMode, ConversionFlags, DitherMode, PaletteMode};
pub use mask::{MaskMode, create_alpha_mask, create_mask_from_color};
pub use quantize::convert_with_palette;

use rasterpix_core::PixelFormat;

/// Convert to a premultiplied-alpha rendition of the image's format
/// family: the byte-ordered RGBA formats stay in their family, already
/// premultiplied formats pass through, everything else lands on
/// `Argb32Premultiplied`.
pub fn to_premultiplied(
    src: &rasterpix_core::Image,
    flags: ConversionFlags,
) -> ConvertResult<rasterpix_core::Image> {
    let target = match src.format() {
        PixelFormat::Rgba8888 | PixelFormat::Rgba8888Premultiplied => {
            PixelFormat::Rgba8888Premultiplied
        }
        f if f.is_premultiplied() => f,
        _ => PixelFormat::Argb32Premultiplied,
    };
    convert_to_format(src, target, flags)
}

/// Convert to the straight-alpha rendition of the image's format
/// family.
pub fn to_unpremultiplied(
    src: &rasterpix_core::Image,
    flags: ConversionFlags,
) -> ConvertResult<rasterpix_core::Image> {
    let target = match src.format() {
        PixelFormat::Rgba8888Premultiplied => PixelFormat::Rgba8888,
        PixelFormat::Argb32Premultiplied => PixelFormat::Argb32,
        f => f,
    };
    convert_to_format(src, target, flags)
}
