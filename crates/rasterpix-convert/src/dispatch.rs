//! Conversion dispatch
//!
//! A dense `format x format` table of converter functions, indexed by
//! format ordinal. Empty cells fall back to the canonical pivot: source
//! to `Argb32`, then `Argb32` to destination. The table is statically
//! complete for every full-color format against the pivot in both
//! directions, so the fallback never needs a third hop; a conversion
//! test asserts that invariant over the whole matrix.
//!
//! A parallel table holds in-place rewrites, consulted only when the
//! handle is the unique owner of a writable buffer and the byte
//! footprint does not change. Conversions that would grow the pixel
//! size always allocate fresh.

use crate::direct::{
    convert_generic, convert_mask_alpha, convert_premultiply, convert_swizzle_rb,
    convert_unpremultiply, inplace_generic, inplace_mask_alpha, inplace_mono_flip,
    inplace_premultiply, inplace_swizzle_rb, inplace_unpremultiply,
};
use crate::error::{ConvertError, ConvertResult};
use crate::flags::ConversionFlags;
use crate::indexed::{
    convert_indexed8_to_x32, convert_mono_flip, convert_mono_to_indexed8, convert_mono_to_x32,
};
use crate::quantize::{
    convert_argb_pm_to_indexed8, convert_argb_pm_to_mono, convert_rgb_to_indexed8,
    convert_x_to_mono,
};
use rasterpix_core::{Image, N_FORMATS, PixelFormat};
use tracing::debug;

/// Copy converter: reads the source, writes a fresh destination.
pub type ConvertFn = fn(&Image, PixelFormat, ConversionFlags) -> ConvertResult<Image>;

/// In-place converter: rewrites the unique buffer and retags it.
pub type InPlaceFn = fn(&mut Image, PixelFormat, ConversionFlags) -> bool;

const MONO: usize = PixelFormat::Mono as usize;
const MONO_LSB: usize = PixelFormat::MonoLsb as usize;
const INDEXED8: usize = PixelFormat::Indexed8 as usize;
const RGB32: usize = PixelFormat::Rgb32 as usize;
const ARGB32: usize = PixelFormat::Argb32 as usize;
const ARGB32_PM: usize = PixelFormat::Argb32Premultiplied as usize;
const RGBX8888: usize = PixelFormat::Rgbx8888 as usize;
const RGBA8888: usize = PixelFormat::Rgba8888 as usize;
const RGBA8888_PM: usize = PixelFormat::Rgba8888Premultiplied as usize;

static CONVERTER_TABLE: [[Option<ConvertFn>; N_FORMATS]; N_FORMATS] = {
    let mut t: [[Option<ConvertFn>; N_FORMATS]; N_FORMATS] = [[None; N_FORMATS]; N_FORMATS];

    // mono family
    t[MONO][MONO_LSB] = Some(convert_mono_flip);
    t[MONO_LSB][MONO] = Some(convert_mono_flip);
    t[MONO][INDEXED8] = Some(convert_mono_to_indexed8);
    t[MONO_LSB][INDEXED8] = Some(convert_mono_to_indexed8);
    let mut dst = RGB32;
    while dst <= ARGB32_PM {
        t[MONO][dst] = Some(convert_mono_to_x32);
        t[MONO_LSB][dst] = Some(convert_mono_to_x32);
        t[INDEXED8][dst] = Some(convert_indexed8_to_x32);
        dst += 1;
    }

    // down to mono and indexed
    t[INDEXED8][MONO] = Some(convert_x_to_mono);
    t[INDEXED8][MONO_LSB] = Some(convert_x_to_mono);
    t[RGB32][MONO] = Some(convert_x_to_mono);
    t[RGB32][MONO_LSB] = Some(convert_x_to_mono);
    t[ARGB32][MONO] = Some(convert_x_to_mono);
    t[ARGB32][MONO_LSB] = Some(convert_x_to_mono);
    t[ARGB32_PM][MONO] = Some(convert_argb_pm_to_mono);
    t[ARGB32_PM][MONO_LSB] = Some(convert_argb_pm_to_mono);
    t[RGB32][INDEXED8] = Some(convert_rgb_to_indexed8);
    t[ARGB32][INDEXED8] = Some(convert_rgb_to_indexed8);
    t[ARGB32_PM][INDEXED8] = Some(convert_argb_pm_to_indexed8);

    // 32-bit family: masks, premultiplies, swizzles
    t[RGB32][ARGB32] = Some(convert_mask_alpha);
    t[ARGB32][RGB32] = Some(convert_mask_alpha);
    t[RGB32][ARGB32_PM] = Some(convert_mask_alpha);
    t[ARGB32][ARGB32_PM] = Some(convert_premultiply);
    t[ARGB32_PM][ARGB32] = Some(convert_unpremultiply);
    t[RGBA8888][RGBA8888_PM] = Some(convert_premultiply);
    t[RGBA8888_PM][RGBA8888] = Some(convert_unpremultiply);
    t[RGBX8888][RGBA8888] = Some(convert_mask_alpha);
    t[RGBX8888][RGBA8888_PM] = Some(convert_mask_alpha);
    t[ARGB32][RGBA8888] = Some(convert_swizzle_rb);
    t[RGBA8888][ARGB32] = Some(convert_swizzle_rb);
    t[RGB32][RGBX8888] = Some(convert_swizzle_rb);
    t[RGBX8888][RGB32] = Some(convert_swizzle_rb);
    t[ARGB32_PM][RGBA8888_PM] = Some(convert_swizzle_rb);
    t[RGBA8888_PM][ARGB32_PM] = Some(convert_swizzle_rb);

    // pivot completeness: every full-color format converts directly to
    // and from Argb32
    let mut f = RGB32;
    while f < N_FORMATS {
        if t[f][ARGB32].is_none() {
            t[f][ARGB32] = Some(convert_generic);
        }
        if t[ARGB32][f].is_none() {
            t[ARGB32][f] = Some(convert_generic);
        }
        f += 1;
    }

    t
};

static INPLACE_TABLE: [[Option<InPlaceFn>; N_FORMATS]; N_FORMATS] = {
    let mut t: [[Option<InPlaceFn>; N_FORMATS]; N_FORMATS] = [[None; N_FORMATS]; N_FORMATS];

    t[MONO][MONO_LSB] = Some(inplace_mono_flip);
    t[MONO_LSB][MONO] = Some(inplace_mono_flip);

    t[RGB32][ARGB32] = Some(inplace_mask_alpha);
    t[ARGB32][RGB32] = Some(inplace_mask_alpha);
    t[RGB32][ARGB32_PM] = Some(inplace_mask_alpha);
    t[ARGB32][ARGB32_PM] = Some(inplace_premultiply);
    t[ARGB32_PM][ARGB32] = Some(inplace_unpremultiply);
    t[RGBA8888][RGBA8888_PM] = Some(inplace_premultiply);
    t[RGBA8888_PM][RGBA8888] = Some(inplace_unpremultiply);
    t[RGBX8888][RGBA8888] = Some(inplace_mask_alpha);
    t[RGBX8888][RGBA8888_PM] = Some(inplace_mask_alpha);
    t[ARGB32][RGBA8888] = Some(inplace_swizzle_rb);
    t[RGBA8888][ARGB32] = Some(inplace_swizzle_rb);
    t[RGB32][RGBX8888] = Some(inplace_swizzle_rb);
    t[RGBX8888][RGB32] = Some(inplace_swizzle_rb);
    t[ARGB32_PM][RGBA8888_PM] = Some(inplace_swizzle_rb);
    t[RGBA8888_PM][ARGB32_PM] = Some(inplace_swizzle_rb);

    t
};

/// Converter registered for `(from, to)`, if any.
pub(crate) fn direct_converter(from: PixelFormat, to: PixelFormat) -> Option<ConvertFn> {
    CONVERTER_TABLE[from.ordinal()][to.ordinal()]
}

/// Convert an image to another pixel format.
///
/// The same format returns a cheap shared clone and the null image
/// stays null. With no direct converter the conversion pivots through
/// `Argb32`; [`ConvertError::UnsupportedConversion`] is returned only
/// when one of the pivot legs is missing, which the completeness
/// invariant confines to hypothetical table regressions.
pub fn convert_to_format(
    src: &Image,
    format: PixelFormat,
    flags: ConversionFlags,
) -> ConvertResult<Image> {
    if src.is_null() {
        return Ok(Image::null());
    }
    if src.format() == format {
        return Ok(src.clone());
    }
    if format == PixelFormat::Invalid {
        return Err(ConvertError::UnsupportedConversion { from: src.format(), to: format });
    }

    if let Some(converter) = direct_converter(src.format(), format) {
        return converter(src, format, flags);
    }

    // two-hop fallback through the canonical pivot
    debug!(from = ?src.format(), to = ?format, "no direct converter, pivoting through Argb32");
    let unsupported = || ConvertError::UnsupportedConversion { from: src.format(), to: format };
    let to_pivot = direct_converter(src.format(), PixelFormat::Argb32).ok_or_else(unsupported)?;
    let from_pivot = direct_converter(PixelFormat::Argb32, format).ok_or_else(unsupported)?;
    let pivot = to_pivot(src, PixelFormat::Argb32, flags)?;
    from_pivot(&pivot, format, flags)
}

/// Try to convert without allocating a second buffer.
///
/// Only fires when this handle uniquely owns a writable buffer and an
/// in-place rewrite exists for the pair (same byte footprint). Returns
/// whether the image now has `format`; on false the image is
/// untouched and the caller falls back to [`convert_to_format`].
pub fn convert_in_place(image: &mut Image, format: PixelFormat, flags: ConversionFlags) -> bool {
    if image.is_null() || format == PixelFormat::Invalid {
        return false;
    }
    if image.format() == format {
        return true;
    }
    if !image.is_detached() || image.is_read_only() {
        return false;
    }
    match INPLACE_TABLE[image.format().ordinal()][format.ordinal()] {
        Some(f) => f(image, format, flags),
        None if image.format().is_full_color()
            && format.is_full_color()
            && image.format().depth() == format.depth() =>
        {
            inplace_generic(image, format, flags)
        }
        None => false,
    }
}
