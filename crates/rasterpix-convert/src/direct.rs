//! Direct-color converters
//!
//! Copy converters between the full-color formats, plus the in-place
//! rewrites that are legal when the byte footprint does not change.
//! The generic pair covers every full-color format against the
//! canonical `Argb32` pivot; the specialized word loops cover the
//! 32-bit family cells where the conversion is a mask, a premultiply
//! or a byte swizzle.

use crate::error::{ConvertError, ConvertResult};
use crate::flags::ConversionFlags;
use rasterpix_core::packed::{argb_to_raw, raw_to_argb, read_raw, write_raw};
use rasterpix_core::{Image, PixelFormat, argb};

/// Allocate the destination image of a copy converter and carry the
/// travelling metadata.
pub(crate) fn conversion_target(src: &Image, format: PixelFormat) -> ConvertResult<Image> {
    let mut out = Image::new(src.width(), src.height(), format)?;
    out.clone_metadata_from(src);
    Ok(out)
}

/// Generic full-color conversion: unpack each raw pixel to ARGB32 and
/// repack into the destination format.
pub(crate) fn convert_generic(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    let sf = src.format();
    let mut out = conversion_target(src, format)?;
    let w = src.width() as usize;
    let sbpp = (sf.depth() / 8) as usize;
    let dbpp = (format.depth() / 8) as usize;
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
    for y in 0..src.height() as usize {
        let srow = &src_bytes[y * sstride..];
        let drow = &mut dst_bytes[y * dstride..];
        for x in 0..w {
            let color = raw_to_argb(sf, read_raw(srow, x * sbpp, sbpp));
            write_raw(drow, x * dbpp, dbpp, argb_to_raw(format, color));
        }
    }
    Ok(out)
}

/// Word-copy with the alpha byte forced opaque: the `Rgb32` /
/// `Rgbx8888` cells of the 32-bit family.
pub(crate) fn convert_mask_alpha(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    let mut out = conversion_target(src, format)?;
    per_word(src, &mut out, |p| p | 0xff00_0000)?;
    Ok(out)
}

/// `Argb32 -> Argb32Premultiplied` (and the byte-ordered pair).
pub(crate) fn convert_premultiply(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    let mut out = conversion_target(src, format)?;
    if src.format().info().byte_ordered {
        per_word(src, &mut out, |p| swizzle_rb(argb::premultiply(swizzle_rb(p))))?;
    } else {
        per_word(src, &mut out, argb::premultiply)?;
    }
    Ok(out)
}

/// `Argb32Premultiplied -> Argb32` (and the byte-ordered pair).
pub(crate) fn convert_unpremultiply(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    let mut out = conversion_target(src, format)?;
    if src.format().info().byte_ordered {
        per_word(src, &mut out, |p| swizzle_rb(argb::unpremultiply(swizzle_rb(p))))?;
    } else {
        per_word(src, &mut out, argb::unpremultiply)?;
    }
    Ok(out)
}

/// Swap R and B bytes: converts between host-order ARGB words and the
/// byte-ordered RGBA family at equal alpha mode.
pub(crate) fn convert_swizzle_rb(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    let mut out = conversion_target(src, format)?;
    let force_opaque = !format.has_alpha_channel() || !src.format().has_alpha_channel();
    per_word(src, &mut out, |p| {
        let v = swizzle_rb(p);
        if force_opaque { v | 0xff00_0000 } else { v }
    })?;
    Ok(out)
}

/// Swap the R and B channels of every pixel, staying in the same
/// format family. Works on any direct-color format.
pub fn rgb_swapped(src: &Image) -> ConvertResult<Image> {
    if src.is_null() {
        return Ok(Image::null());
    }
    let format = src.format();
    if format.is_indexed() {
        // swap inside the color table instead of the pixels
        let mut out = src.copy(rasterpix_core::Rect::null());
        let table: Vec<u32> = src
            .color_table()
            .map(|t| t.entries().iter().map(|&c| swizzle_rb(c)).collect())
            .unwrap_or_default();
        out.set_color_table(&table);
        return Ok(out);
    }
    let mut out = conversion_target(src, format)?;
    let w = src.width() as usize;
    let bpp = (format.depth() / 8) as usize;
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
    for y in 0..src.height() as usize {
        let srow = &src_bytes[y * sstride..];
        let drow = &mut dst_bytes[y * dstride..];
        for x in 0..w {
            let color = raw_to_argb(format, read_raw(srow, x * bpp, bpp));
            write_raw(drow, x * bpp, bpp, argb_to_raw(format, swizzle_rb(color)));
        }
    }
    Ok(out)
}

/// Swap bytes 0 and 2 of a word. On raw little-endian words this maps
/// ARGB host order to RGBA byte order and back; on an ARGB value it
/// exchanges the R and B channels. The bit operation is the same.
#[inline]
fn swizzle_rb(p: u32) -> u32 {
    (p & 0xff00_ff00) | ((p & 0x00ff_0000) >> 16) | ((p & 0x0000_00ff) << 16)
}

fn per_word(src: &Image, out: &mut Image, f: impl Fn(u32) -> u32) -> ConvertResult<()> {
    let w = src.width() as usize;
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits();
    let Some(dst_bytes) = out.bits_mut() else {
        return Err(ConvertError::Core(rasterpix_core::Error::AllocationFailed));
    };
    for y in 0..src.height() as usize {
        let srow = &src_bytes[y * sstride..];
        let drow = &mut dst_bytes[y * dstride..];
        for x in 0..w {
            write_raw(drow, x * 4, 4, f(read_raw(srow, x * 4, 4)));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------
// In-place rewrites (unique, writable, same byte footprint)
// ---------------------------------------------------------------------

fn rewrite_words_in_place(image: &mut Image, format: PixelFormat, f: impl Fn(u32) -> u32) -> bool {
    let w = image.width() as usize;
    let h = image.height() as usize;
    let stride = image.stride() as usize;
    let Some(bytes) = image.bits_mut() else { return false };
    for y in 0..h {
        let row = &mut bytes[y * stride..];
        for x in 0..w {
            write_raw(row, x * 4, 4, f(read_raw(row, x * 4, 4)));
        }
    }
    image.reinterpret_format(format)
}

pub(crate) fn inplace_mask_alpha(image: &mut Image, format: PixelFormat, _flags: ConversionFlags) -> bool {
    rewrite_words_in_place(image, format, |p| p | 0xff00_0000)
}

pub(crate) fn inplace_premultiply(image: &mut Image, format: PixelFormat, _flags: ConversionFlags) -> bool {
    if image.format().info().byte_ordered {
        rewrite_words_in_place(image, format, |p| swizzle_rb(argb::premultiply(swizzle_rb(p))))
    } else {
        rewrite_words_in_place(image, format, argb::premultiply)
    }
}

pub(crate) fn inplace_unpremultiply(image: &mut Image, format: PixelFormat, _flags: ConversionFlags) -> bool {
    if image.format().info().byte_ordered {
        rewrite_words_in_place(image, format, |p| swizzle_rb(argb::unpremultiply(swizzle_rb(p))))
    } else {
        rewrite_words_in_place(image, format, argb::unpremultiply)
    }
}

pub(crate) fn inplace_swizzle_rb(image: &mut Image, format: PixelFormat, _flags: ConversionFlags) -> bool {
    let force_opaque = !format.has_alpha_channel() || !image.format().has_alpha_channel();
    rewrite_words_in_place(image, format, |p| {
        let v = swizzle_rb(p);
        if force_opaque { v | 0xff00_0000 } else { v }
    })
}

/// Generic same-depth rewrite for full-color pairs without a dedicated
/// in-place entry: unpack and repack every pixel, then retag.
pub(crate) fn inplace_generic(image: &mut Image, format: PixelFormat, _flags: ConversionFlags) -> bool {
    let sf = image.format();
    if sf.depth() != format.depth() {
        return false;
    }
    let bpp = (sf.depth() / 8) as usize;
    let w = image.width() as usize;
    let h = image.height() as usize;
    let stride = image.stride() as usize;
    let Some(bytes) = image.bits_mut() else { return false };
    for y in 0..h {
        let row = &mut bytes[y * stride..];
        for x in 0..w {
            let color = raw_to_argb(sf, read_raw(row, x * bpp, bpp));
            write_raw(row, x * bpp, bpp, argb_to_raw(format, color));
        }
    }
    image.reinterpret_format(format)
}

/// Mono <-> MonoLsb: reverse the bits of every used byte.
pub(crate) fn inplace_mono_flip(image: &mut Image, format: PixelFormat, _flags: ConversionFlags) -> bool {
    let used = (image.width() as usize).div_ceil(8);
    let h = image.height() as usize;
    let stride = image.stride() as usize;
    let Some(bytes) = image.bits_mut() else { return false };
    for y in 0..h {
        for b in &mut bytes[y * stride..y * stride + used] {
            *b = crate::dither::BITFLIP[*b as usize];
        }
    }
    image.reinterpret_format(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterpix_core::argb::{rgb, rgba};

    #[test]
    fn test_generic_rgb16_roundtrip() {
        let mut src = Image::new(3, 2, PixelFormat::Argb32).unwrap();
        src.fill_color(rgb(255, 0, 0));
        let as16 = convert_generic(&src, PixelFormat::Rgb16, ConversionFlags::default()).unwrap();
        assert_eq!(as16.format(), PixelFormat::Rgb16);
        assert_eq!(as16.pixel(0, 0), rgb(255, 0, 0));
        let back = convert_generic(&as16, PixelFormat::Argb32, ConversionFlags::default()).unwrap();
        assert_eq!(back.pixel(2, 1), rgb(255, 0, 0));
    }

    #[test]
    fn test_premultiply_pair() {
        let mut src = Image::new(1, 1, PixelFormat::Argb32).unwrap();
        src.set_pixel(0, 0, rgba(128, 64, 32, 128));
        let pm =
            convert_premultiply(&src, PixelFormat::Argb32Premultiplied, ConversionFlags::default())
                .unwrap();
        // raw word carries premultiplied channels
        assert_eq!(pm.scan_line(0)[..4], [16, 32, 64, 128]);
        let back =
            convert_unpremultiply(&pm, PixelFormat::Argb32, ConversionFlags::default()).unwrap();
        // premultiply at alpha 128 loses at most one step per channel
        let c = back.pixel(0, 0);
        assert_eq!(argb::alpha(c), 128);
        assert!((argb::red(c) as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_mask_alpha() {
        let mut src = Image::new(1, 1, PixelFormat::Argb32).unwrap();
        src.set_pixel(0, 0, rgba(10, 20, 30, 40));
        let out = convert_mask_alpha(&src, PixelFormat::Rgb32, ConversionFlags::default()).unwrap();
        assert_eq!(out.pixel(0, 0), rgb(10, 20, 30));
    }

    #[test]
    fn test_swizzle_argb_to_rgba_bytes() {
        let mut src = Image::new(1, 1, PixelFormat::Argb32).unwrap();
        src.set_pixel(0, 0, rgba(1, 2, 3, 4));
        let out = convert_swizzle_rb(&src, PixelFormat::Rgba8888, ConversionFlags::default()).unwrap();
        assert_eq!(out.scan_line(0)[..4], [1, 2, 3, 4]);
        assert_eq!(out.pixel(0, 0), rgba(1, 2, 3, 4));
    }

    #[test]
    fn test_rgb_swapped_direct() {
        let mut src = Image::new(1, 1, PixelFormat::Rgb888).unwrap();
        src.set_pixel(0, 0, rgb(10, 20, 30));
        let out = rgb_swapped(&src).unwrap();
        assert_eq!(out.format(), PixelFormat::Rgb888);
        assert_eq!(out.pixel(0, 0), rgb(30, 20, 10));
    }

    #[test]
    fn test_rgb_swapped_indexed_swaps_table() {
        let mut src = Image::new(2, 1, PixelFormat::Indexed8).unwrap();
        src.set_color_table(&[rgb(255, 0, 0)]);
        src.fill(0);
        let out = rgb_swapped(&src).unwrap();
        assert_eq!(out.pixel(0, 0), rgb(0, 0, 255));
        assert_eq!(out.pixel_index(0, 0), 0);
    }

    #[test]
    fn test_inplace_premultiply_retags() {
        let mut img = Image::new(1, 1, PixelFormat::Argb32).unwrap();
        img.set_pixel(0, 0, rgba(255, 255, 255, 128));
        assert!(inplace_premultiply(&mut img, PixelFormat::Argb32Premultiplied, ConversionFlags::default()));
        assert_eq!(img.format(), PixelFormat::Argb32Premultiplied);
        assert_eq!(img.scan_line(0)[..4], [128, 128, 128, 128]);
    }

    #[test]
    fn test_inplace_mono_flip() {
        let mut img = Image::new(8, 1, PixelFormat::Mono).unwrap();
        img.set_pixel(0, 0, 1);
        assert!(inplace_mono_flip(&mut img, PixelFormat::MonoLsb, ConversionFlags::default()));
        assert_eq!(img.format(), PixelFormat::MonoLsb);
        // the leftmost pixel stays the leftmost pixel
        assert_eq!(img.pixel_index(0, 0), 1);
        assert_eq!(img.scan_line(0)[0], 0x01);
    }
}
