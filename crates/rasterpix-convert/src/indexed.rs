//! Indexed and monochrome conversions
//!
//! Table-lookup expansion of Mono/MonoLsb/Indexed8 sources into the
//! 32-bit family, and the bit-order flip between the two mono formats.

use crate::dither::BITFLIP;
use crate::error::ConvertResult;
use crate::flags::ConversionFlags;
use rasterpix_core::color_table::MONO_TABLE;
use rasterpix_core::packed::write_raw;
use rasterpix_core::{Image, PixelFormat, argb};

/// Adapt a source color table to the destination 32-bit format:
/// `Rgb32` forces every entry opaque, the premultiplied target
/// premultiplies each entry, `Argb32` keeps entries as they are.
pub(crate) fn fix_color_table(entries: &[u32], format: PixelFormat) -> Vec<u32> {
    match format {
        PixelFormat::Rgb32 => entries.iter().map(|&c| c | 0xff00_0000).collect(),
        PixelFormat::Argb32Premultiplied => entries.iter().map(|&c| argb::premultiply(c)).collect(),
        _ => entries.to_vec(),
    }
}

/// Mono <-> MonoLsb: same pixels, reversed bit order in every byte.
pub(crate) fn convert_mono_flip(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    let mut out = Image::new(src.width(), src.height(), format)?;
    out.clone_metadata_from(src);
    if let Some(t) = src.color_table() {
        out.set_color_table(t.entries());
    }
    let used = (src.width() as usize).div_ceil(8);
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
    for y in 0..src.height() as usize {
        let srow = &src_bytes[y * sstride..y * sstride + used];
        let drow = &mut dst_bytes[y * dstride..y * dstride + used];
        for (d, s) in drow.iter_mut().zip(srow) {
            *d = BITFLIP[*s as usize];
        }
    }
    Ok(out)
}

/// Mono/MonoLsb -> Indexed8: one byte per former bit, table carried.
pub(crate) fn convert_mono_to_indexed8(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    debug_assert_eq!(format, PixelFormat::Indexed8);
    let mut out = Image::new(src.width(), src.height(), format)?;
    out.clone_metadata_from(src);
    match src.color_table() {
        Some(t) if !t.is_empty() => out.set_color_table(t.entries()),
        _ => out.set_color_table(&MONO_TABLE),
    }
    let lsb = src.format() == PixelFormat::MonoLsb;
    let w = src.width() as usize;
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
    for y in 0..src.height() as usize {
        let srow = &src_bytes[y * sstride..];
        let drow = &mut dst_bytes[y * dstride..];
        for (x, d) in drow[..w].iter_mut().enumerate() {
            let bit = if lsb {
                (srow[x >> 3] >> (x & 7)) & 1
            } else {
                (srow[x >> 3] >> (7 - (x & 7))) & 1
            };
            *d = bit;
        }
    }
    Ok(out)
}

/// Mono/MonoLsb -> Rgb32/Argb32/Argb32Premultiplied.
pub(crate) fn convert_mono_to_x32(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    let mut out = Image::new(src.width(), src.height(), format)?;
    out.clone_metadata_from(src);
    let mut table: Vec<u32> = match src.color_table() {
        Some(t) if !t.is_empty() => fix_color_table(t.entries(), format),
        _ => MONO_TABLE.to_vec(),
    };
    // guarantee two resolvable entries
    while table.len() < 2 {
        table.push(0xffff_ffff);
    }
    let lsb = src.format() == PixelFormat::MonoLsb;
    let w = src.width() as usize;
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
    for y in 0..src.height() as usize {
        let srow = &src_bytes[y * sstride..];
        let drow = &mut dst_bytes[y * dstride..];
        for x in 0..w {
            let bit = if lsb {
                (srow[x >> 3] >> (x & 7)) & 1
            } else {
                (srow[x >> 3] >> (7 - (x & 7))) & 1
            };
            write_raw(drow, x * 4, 4, table[bit as usize]);
        }
    }
    Ok(out)
}

/// Indexed8 -> Rgb32/Argb32/Argb32Premultiplied.
///
/// A missing or empty table is treated as the identity grayscale ramp;
/// out-of-table indices clamp to the last entry.
pub(crate) fn convert_indexed8_to_x32(
    src: &Image,
    format: PixelFormat,
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    let mut out = Image::new(src.width(), src.height(), format)?;
    out.clone_metadata_from(src);
    let table: Vec<u32> = match src.color_table() {
        Some(t) if !t.is_empty() => fix_color_table(t.entries(), format),
        _ => (0..256).map(|i| argb::rgb(i as u8, i as u8, i as u8)).collect(),
    };
    let last = table.len() - 1;
    let w = src.width() as usize;
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
    for y in 0..src.height() as usize {
        let srow = &src_bytes[y * sstride..];
        let drow = &mut dst_bytes[y * dstride..];
        for x in 0..w {
            let index = (srow[x] as usize).min(last);
            write_raw(drow, x * 4, 4, table[index]);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterpix_core::argb::{rgb, rgba};

    #[test]
    fn test_mono_to_argb32_uses_table() {
        let mut src = Image::new(10, 2, PixelFormat::Mono).unwrap();
        src.set_color_table(&[rgb(255, 0, 0), rgb(0, 0, 255)]);
        src.fill(0);
        src.set_pixel(3, 1, 1);
        let out = convert_mono_to_x32(&src, PixelFormat::Argb32, ConversionFlags::default()).unwrap();
        assert_eq!(out.pixel(0, 0), rgb(255, 0, 0));
        assert_eq!(out.pixel(3, 1), rgb(0, 0, 255));
    }

    #[test]
    fn test_mono_default_table_black_white() {
        let src = Image::new(4, 1, PixelFormat::Mono).unwrap();
        let out = convert_mono_to_x32(&src, PixelFormat::Rgb32, ConversionFlags::default()).unwrap();
        assert_eq!(out.pixel(0, 0), rgb(0, 0, 0));
    }

    #[test]
    fn test_indexed8_to_rgb32_forces_opaque() {
        let mut src = Image::new(2, 1, PixelFormat::Indexed8).unwrap();
        src.set_color_table(&[rgba(10, 20, 30, 77)]);
        src.fill(0);
        let out =
            convert_indexed8_to_x32(&src, PixelFormat::Rgb32, ConversionFlags::default()).unwrap();
        assert_eq!(out.pixel(0, 0), rgb(10, 20, 30));
        let keep =
            convert_indexed8_to_x32(&src, PixelFormat::Argb32, ConversionFlags::default()).unwrap();
        assert_eq!(keep.pixel(0, 0), rgba(10, 20, 30, 77));
    }

    #[test]
    fn test_indexed8_to_premultiplied() {
        let mut src = Image::new(1, 1, PixelFormat::Indexed8).unwrap();
        src.set_color_table(&[rgba(255, 255, 255, 128)]);
        src.fill(0);
        let out = convert_indexed8_to_x32(
            &src,
            PixelFormat::Argb32Premultiplied,
            ConversionFlags::default(),
        )
        .unwrap();
        assert_eq!(out.scan_line(0)[..4], [128, 128, 128, 128]);
    }

    #[test]
    fn test_indexed8_without_table_is_gray_ramp() {
        let mut src = Image::new(1, 1, PixelFormat::Indexed8).unwrap();
        src.bits_mut().unwrap()[0] = 200;
        let out =
            convert_indexed8_to_x32(&src, PixelFormat::Rgb32, ConversionFlags::default()).unwrap();
        assert_eq!(out.pixel(0, 0), rgb(200, 200, 200));
    }

    #[test]
    fn test_indexed8_clamps_out_of_table() {
        let mut src = Image::new(1, 1, PixelFormat::Indexed8).unwrap();
        src.set_color_table(&[rgb(1, 1, 1), rgb(2, 2, 2)]);
        src.bits_mut().unwrap()[0] = 9;
        let out =
            convert_indexed8_to_x32(&src, PixelFormat::Argb32, ConversionFlags::default()).unwrap();
        assert_eq!(out.pixel(0, 0), rgb(2, 2, 2));
    }

    #[test]
    fn test_mono_flip_preserves_pixels() {
        let mut src = Image::new(12, 1, PixelFormat::Mono).unwrap();
        for x in [0, 5, 11] {
            src.set_pixel(x, 0, 1);
        }
        let out = convert_mono_flip(&src, PixelFormat::MonoLsb, ConversionFlags::default()).unwrap();
        assert_eq!(out.format(), PixelFormat::MonoLsb);
        for x in 0..12 {
            assert_eq!(out.pixel_index(x, 0), src.pixel_index(x, 0), "x={x}");
        }
    }

    #[test]
    fn test_mono_to_indexed8() {
        let mut src = Image::new(9, 1, PixelFormat::MonoLsb).unwrap();
        src.set_pixel(8, 0, 1);
        let out =
            convert_mono_to_indexed8(&src, PixelFormat::Indexed8, ConversionFlags::default()).unwrap();
        assert_eq!(out.color_count(), 2);
        assert_eq!(out.pixel_index(8, 0), 1);
        assert_eq!(out.pixel_index(0, 0), 0);
    }
}
