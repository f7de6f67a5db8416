//! 32-bit to indexed conversion
//!
//! Two strategies:
//!
//! - **Exact**: a prime-sized open-addressing hash table assigns
//!   palette indices to distinct pixel values on the fly. Images with
//!   at most 256 distinct colors convert losslessly.
//! - **Uniform quantization**: when the exact pass overflows (or
//!   dithering is explicitly preferred), the image is redone against a
//!   fixed 6x6x6 color cube with threshold, ordered or
//!   error-diffusion dithering. Error diffusion runs boustrophedon
//!   (alternating scan direction per row) independently per channel to
//!   cancel directional bias. Sources with an alpha channel reserve
//!   cube slot 216 as a transparent entry keyed by a dithered alpha
//!   mask.
//!
//! `convert_with_palette` instead matches every pixel to a caller-fixed
//! palette by Manhattan distance in (R,G,B,A), memoizing per distinct
//! source value.

use crate::dither::{BAYER_MATRIX, dither_to_mono};
use crate::error::{ConvertError, ConvertResult};
use crate::flags::{ConversionFlags, DitherMode, PaletteMode};
use rasterpix_core::packed::read_raw;
use rasterpix_core::{Image, PixelFormat, argb};
use std::collections::HashMap;

/// Manhattan distance between two colors in (R,G,B,A) space.
#[inline]
fn pixel_distance(p1: u32, p2: u32) -> i32 {
    let dr = argb::red(p1) as i32 - argb::red(p2) as i32;
    let dg = argb::green(p1) as i32 - argb::green(p2) as i32;
    let db = argb::blue(p1) as i32 - argb::blue(p2) as i32;
    let da = argb::alpha(p1) as i32 - argb::alpha(p2) as i32;
    dr.abs() + dg.abs() + db.abs() + da.abs()
}

/// Index of the nearest palette entry; ties go to the lowest index.
#[inline]
fn closest_match(pixel: u32, clut: &[u32]) -> usize {
    let mut index = 0;
    let mut closest = i32::MAX;
    for (i, &c) in clut.iter().enumerate() {
        let d = pixel_distance(pixel, c);
        if d < closest {
            closest = d;
            index = i;
        }
    }
    index
}

/// Convert a 32-bit image to an indexed format with a fixed palette.
///
/// Every distinct source value maps to its Manhattan-nearest palette
/// entry; the mapping is memoized per conversion call. Mono targets
/// use only the first two palette entries.
pub fn convert_with_palette(
    src: &Image,
    format: PixelFormat,
    palette: &[u32],
    _flags: ConversionFlags,
) -> ConvertResult<Image> {
    if src.is_null() {
        return Ok(Image::null());
    }
    if !matches!(format, PixelFormat::Mono | PixelFormat::MonoLsb | PixelFormat::Indexed8) {
        return Err(ConvertError::UnsupportedConversion { from: src.format(), to: format });
    }
    if palette.is_empty() || palette.len() > 256 {
        return Err(ConvertError::InvalidPalette(format!(
            "palette must hold 1..=256 entries, got {}",
            palette.len()
        )));
    }
    let src = as_argb32(src)?;

    let mut out = Image::new(src.width(), src.height(), format)?;
    out.clone_metadata_from(&src);
    out.set_color_table(palette);

    let w = src.width() as usize;
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits().to_vec();
    let mut cache: HashMap<u32, u8> = HashMap::new();

    if format == PixelFormat::Indexed8 {
        let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
        for y in 0..src.height() as usize {
            let srow = &src_bytes[y * sstride..];
            let drow = &mut dst_bytes[y * dstride..];
            for (x, d) in drow[..w].iter_mut().enumerate() {
                let p = read_raw(srow, x * 4, 4);
                let index =
                    *cache.entry(p).or_insert_with(|| closest_match(p, palette) as u8);
                *d = index;
            }
        }
    } else {
        let table = &palette[..palette.len().min(2)];
        let lsb = format == PixelFormat::MonoLsb;
        let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
        for y in 0..src.height() as usize {
            let srow = &src_bytes[y * sstride..];
            let drow = &mut dst_bytes[y * dstride..];
            for x in 0..w {
                let p = read_raw(srow, x * 4, 4);
                let index = *cache.entry(p).or_insert_with(|| closest_match(p, table) as u8);
                let mask = if lsb { 1u8 << (x & 7) } else { 0x80u8 >> (x & 7) };
                if index & 1 != 0 {
                    drow[x >> 3] |= mask;
                } else {
                    drow[x >> 3] &= !mask;
                }
            }
        }
    }
    Ok(out)
}

const HASH_SIZE: usize = 997; // prime

#[derive(Clone, Copy, Default)]
struct RgbMapEntry {
    used: bool,
    pix: u8,
    rgb: u32,
}

const MAX_CHANNEL: i32 = 5;

#[inline]
fn cube_index(r: i32, g: i32, b: i32) -> u8 {
    ((r * (MAX_CHANNEL + 1) + g) * (MAX_CHANNEL + 1) + b) as u8
}

/// Rgb32/Argb32 -> Indexed8, adaptive palette with quantized fallback.
pub(crate) fn convert_rgb_to_indexed8(
    src: &Image,
    format: PixelFormat,
    flags: ConversionFlags,
) -> ConvertResult<Image> {
    debug_assert_eq!(format, PixelFormat::Indexed8);
    let src_format = src.format();
    let has_alpha = src_format != PixelFormat::Rgb32;
    let alpha_mask: u32 = if has_alpha { 0 } else { 0xff00_0000 };
    let mut do_quant = flags.palette_mode == PaletteMode::PreferDither || has_alpha;

    let w = src.width() as usize;
    let h = src.height() as usize;
    let mut out = Image::new(src.width(), src.height(), format)?;
    out.clone_metadata_from(src);

    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits().to_vec();

    let mut table = vec![0u32; 256];
    let mut hash = [RgbMapEntry::default(); HASH_SIZE];
    let mut pix_count: usize = 0;

    if flags.palette_mode != PaletteMode::PreferDither {
        // exact pass: assign indices while at most 256 distinct colors
        let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
        'scan: for y in 0..h {
            let srow = &src_bytes[y * sstride..];
            let drow = &mut dst_bytes[y * dstride..];
            for x in 0..w {
                let p = read_raw(srow, x * 4, 4) | alpha_mask;
                let mut slot = (p as usize) % HASH_SIZE;
                loop {
                    if hash[slot].used {
                        if hash[slot].rgb == p {
                            break;
                        }
                        slot += 1;
                        if slot == HASH_SIZE {
                            slot = 0;
                        }
                    } else {
                        if pix_count == 256 {
                            do_quant = true;
                            break 'scan;
                        }
                        table[pix_count] = p;
                        hash[slot] = RgbMapEntry { used: true, pix: pix_count as u8, rgb: p };
                        pix_count += 1;
                        break;
                    }
                }
                drow[x] = hash[slot].pix;
            }
        }
    }

    if !do_quant {
        table.truncate(pix_count);
        out.set_color_table(&table);
        return Ok(out);
    }

    // uniform quantization against the 6x6x6 cube
    for rc in 0..=MAX_CHANNEL {
        for gc in 0..=MAX_CHANNEL {
            for bc in 0..=MAX_CHANNEL {
                table[cube_index(rc, gc, bc) as usize] = argb::rgb(
                    (rc * 255 / MAX_CHANNEL) as u8,
                    (gc * 255 / MAX_CHANNEL) as u8,
                    (bc * 255 / MAX_CHANNEL) as u8,
                );
            }
        }
    }
    // slots 216..255 stay reserved: they keep colors assigned by an
    // overflowed exact pass; untouched ones become opaque black for
    // opaque sources so the table never invents translucency
    if !has_alpha {
        for entry in table.iter_mut().skip(pix_count.max(216)) {
            *entry = argb::rgb(0, 0, 0);
        }
    }

    match flags.color_dither {
        DitherMode::Threshold => {
            let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
            let dither = |p: u32| -> u8 {
                ((p * MAX_CHANNEL as u32 + 127) / 255) as u8
            };
            for y in 0..h {
                let srow = &src_bytes[y * sstride..];
                let drow = &mut dst_bytes[y * dstride..];
                for x in 0..w {
                    let p = read_raw(srow, x * 4, 4);
                    drow[x] = cube_index(
                        dither(argb::red(p) as u32) as i32,
                        dither(argb::green(p) as u32) as i32,
                        dither(argb::blue(p) as u32) as i32,
                    );
                }
            }
        }
        DitherMode::Ordered => {
            let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
            for y in 0..h {
                let srow = &src_bytes[y * sstride..];
                let drow = &mut dst_bytes[y * dstride..];
                for x in 0..w {
                    let p = read_raw(srow, x * 4, 4);
                    let d = (BAYER_MATRIX[y & 15][x & 15] as u32) << 8;
                    let dither = |p: u32| -> i32 {
                        (((256 * MAX_CHANNEL as u32 + MAX_CHANNEL as u32 + 1) * p + d) >> 16)
                            as i32
                    };
                    drow[x] = cube_index(
                        dither(argb::red(p) as u32),
                        dither(argb::green(p) as u32),
                        dither(argb::blue(p) as u32),
                    );
                }
            }
        }
        DitherMode::Diffuse => {
            // bi-directional error diffusion, per channel
            let mut lines = vec![vec![0i32; w]; 6]; // [parity][channel]
            let mut pv = vec![vec![0i32; w]; 3];
            let channel_of = |p: u32, chan: usize| -> i32 {
                match chan {
                    0 => argb::red(p) as i32,
                    1 => argb::green(p) as i32,
                    _ => argb::blue(p) as i32,
                }
            };
            let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
            for y in 0..h {
                let srow = &src_bytes[y * sstride..];
                let next_row = if y + 1 < h { &src_bytes[(y + 1) * sstride..] } else { srow };
                for chan in 0..3 {
                    let (l1_idx, l2_idx) =
                        if y & 1 == 1 { (3 + chan, chan) } else { (chan, 3 + chan) };
                    if y == 0 {
                        for x in 0..w {
                            lines[l1_idx][x] = channel_of(read_raw(srow, x * 4, 4), chan);
                        }
                    }
                    if y + 1 < h {
                        for x in 0..w {
                            lines[l2_idx][x] = channel_of(read_raw(next_row, x * 4, 4), chan);
                        }
                    }
                    if y & 1 == 1 {
                        // left to right
                        for x in 0..w {
                            let v = lines[l1_idx][x];
                            let q = ((v * MAX_CHANNEL + 128) / 255).clamp(0, MAX_CHANNEL);
                            let err = v - q * 255 / MAX_CHANNEL;
                            pv[chan][x] = q;
                            if x + 1 < w {
                                lines[l1_idx][x + 1] += (err * 7) >> 4;
                                lines[l2_idx][x + 1] += err >> 4;
                            }
                            lines[l2_idx][x] += (err * 5) >> 4;
                            if x > 0 {
                                lines[l2_idx][x - 1] += (err * 3) >> 4;
                            }
                        }
                    } else {
                        // right to left
                        for x in (0..w).rev() {
                            let v = lines[l1_idx][x];
                            let q = ((v * MAX_CHANNEL + 128) / 255).clamp(0, MAX_CHANNEL);
                            let err = v - q * 255 / MAX_CHANNEL;
                            pv[chan][x] = q;
                            if x > 0 {
                                lines[l1_idx][x - 1] += (err * 7) >> 4;
                                lines[l2_idx][x - 1] += err >> 4;
                            }
                            lines[l2_idx][x] += (err * 5) >> 4;
                            if x + 1 < w {
                                lines[l2_idx][x + 1] += (err * 3) >> 4;
                            }
                        }
                    }
                }
                let drow = &mut dst_bytes[y * dstride..];
                for x in 0..w {
                    drow[x] = cube_index(pv[0][x], pv[1][x], pv[2][x]);
                }
            }
        }
    }

    if has_alpha {
        // reserve cube slot 216 for transparency, keyed by a mono mask
        const TRANS: u8 = 216;
        table[TRANS as usize] = 0;
        let mask = dither_to_mono(src, PixelFormat::Mono, flags, true)?;
        let mask_stride = mask.stride() as usize;
        let mask_bytes = mask.bits().to_vec();
        let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
        for y in 0..h {
            let mrow = &mask_bytes[y * mask_stride..];
            let drow = &mut dst_bytes[y * dstride..];
            for x in 0..w {
                if mrow[x >> 3] & (0x80 >> (x & 7)) == 0 {
                    drow[x] = TRANS;
                }
            }
        }
    }

    out.set_color_table(&table);
    Ok(out)
}

/// Unpremultiply, then run the adaptive indexed conversion.
pub(crate) fn convert_argb_pm_to_indexed8(
    src: &Image,
    format: PixelFormat,
    flags: ConversionFlags,
) -> ConvertResult<Image> {
    let straight =
        crate::direct::convert_unpremultiply(src, PixelFormat::Argb32, ConversionFlags::default())?;
    convert_rgb_to_indexed8(&straight, format, flags)
}

/// Dither a direct-color image down to one bit per pixel.
pub(crate) fn convert_x_to_mono(
    src: &Image,
    format: PixelFormat,
    flags: ConversionFlags,
) -> ConvertResult<Image> {
    dither_to_mono(src, format, flags, false)
}

/// Unpremultiply, then dither to mono.
pub(crate) fn convert_argb_pm_to_mono(
    src: &Image,
    format: PixelFormat,
    flags: ConversionFlags,
) -> ConvertResult<Image> {
    let straight =
        crate::direct::convert_unpremultiply(src, PixelFormat::Argb32, ConversionFlags::default())?;
    dither_to_mono(&straight, format, flags, false)
}

fn as_argb32(src: &Image) -> ConvertResult<Image> {
    match src.format() {
        PixelFormat::Rgb32 | PixelFormat::Argb32 => Ok(src.clone()),
        _ => crate::dispatch::convert_to_format(src, PixelFormat::Argb32, ConversionFlags::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterpix_core::argb::{rgb, rgba};

    #[test]
    fn test_closest_match_manhattan_ties_to_lowest() {
        let clut = [rgb(0, 0, 0), rgb(0, 0, 2), rgb(2, 0, 0)];
        // equidistant from entries 1 and 2; entry 1 wins
        assert_eq!(closest_match(rgb(1, 0, 1), &clut), 1);
        assert_eq!(closest_match(rgb(0, 0, 0), &clut), 0);
        assert_eq!(closest_match(rgb(3, 0, 0), &clut), 2);
    }

    #[test]
    fn test_exact_pass_under_256_colors() {
        let mut src = Image::new(8, 8, PixelFormat::Rgb32).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                src.set_pixel(x, y, rgb((x * 8) as u8, (y * 8) as u8, 0));
            }
        }
        let out =
            convert_rgb_to_indexed8(&src, PixelFormat::Indexed8, ConversionFlags::default()).unwrap();
        assert_eq!(out.color_count(), 64);
        // lossless through the palette
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(out.pixel(x, y), src.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_overflow_falls_back_to_cube() {
        // 32x32 distinct colors > 256
        let mut src = Image::new(32, 32, PixelFormat::Rgb32).unwrap();
        for y in 0..32 {
            for x in 0..32 {
                src.set_pixel(x, y, rgb(x as u8 * 8, y as u8 * 8, ((x + y) & 0xff) as u8));
            }
        }
        let out =
            convert_rgb_to_indexed8(&src, PixelFormat::Indexed8, ConversionFlags::default()).unwrap();
        // quantized table: full 256 entries, cube in the first 216
        assert_eq!(out.color_count(), 256);
        assert_eq!(out.color(0), rgb(0, 0, 0));
        assert_eq!(out.color(215), rgb(255, 255, 255));
        assert_eq!(out.color(cube_index(5, 0, 0) as usize), rgb(255, 0, 0));
    }

    #[test]
    fn test_cube_index_layout() {
        assert_eq!(cube_index(0, 0, 0), 0);
        assert_eq!(cube_index(0, 0, 5), 5);
        assert_eq!(cube_index(0, 1, 0), 6);
        assert_eq!(cube_index(1, 0, 0), 36);
        assert_eq!(cube_index(5, 5, 5), 215);
    }

    #[test]
    fn test_threshold_quant_maps_to_nearest_cube_corner() {
        let mut src = Image::new(2, 1, PixelFormat::Rgb32).unwrap();
        src.set_pixel(0, 0, rgb(250, 3, 128));
        src.set_pixel(1, 0, rgb(0, 255, 0));
        let flags = ConversionFlags {
            palette_mode: PaletteMode::PreferDither,
            color_dither: DitherMode::Threshold,
            ..Default::default()
        };
        let out = convert_rgb_to_indexed8(&src, PixelFormat::Indexed8, flags).unwrap();
        // (250,3,128) -> levels (5,0,3); (0,255,0) -> (0,5,0)
        assert_eq!(out.pixel_index(0, 0), cube_index(5, 0, 3) as u32);
        assert_eq!(out.pixel_index(1, 0), cube_index(0, 5, 0) as u32);
        assert_eq!(out.pixel(1, 0), rgb(0, 255, 0));
    }

    #[test]
    fn test_alpha_source_reserves_transparent_slot() {
        let mut src = Image::new(4, 1, PixelFormat::Argb32).unwrap();
        src.set_pixel(0, 0, rgba(255, 0, 0, 255));
        src.set_pixel(1, 0, rgba(0, 0, 0, 0));
        src.set_pixel(2, 0, rgba(0, 255, 0, 255));
        src.set_pixel(3, 0, rgba(0, 0, 0, 10));
        let out = convert_rgb_to_indexed8(
            &src,
            PixelFormat::Indexed8,
            ConversionFlags::threshold(),
        )
        .unwrap();
        assert_eq!(out.color(216), 0);
        assert_eq!(out.pixel_index(1, 0), 216);
        assert_eq!(out.pixel_index(3, 0), 216);
        assert_ne!(out.pixel_index(0, 0), 216);
        assert!(out.has_alpha_channel());
    }

    #[test]
    fn test_convert_with_palette_memoized_mapping() {
        let mut src = Image::new(4, 2, PixelFormat::Argb32).unwrap();
        src.fill_color(rgb(200, 30, 40));
        src.set_pixel(0, 0, rgb(10, 10, 200));
        let palette = [rgb(255, 0, 0), rgb(0, 0, 255), rgb(0, 255, 0)];
        let out =
            convert_with_palette(&src, PixelFormat::Indexed8, &palette, ConversionFlags::default())
                .unwrap();
        assert_eq!(out.pixel_index(0, 0), 1);
        assert_eq!(out.pixel_index(1, 0), 0);
        assert_eq!(out.pixel(1, 1), rgb(255, 0, 0));
    }

    #[test]
    fn test_convert_with_palette_mono() {
        let mut src = Image::new(8, 1, PixelFormat::Rgb32).unwrap();
        src.fill_color(rgb(240, 240, 240));
        src.set_pixel(2, 0, rgb(5, 5, 5));
        let palette = [rgb(255, 255, 255), rgb(0, 0, 0)];
        let out = convert_with_palette(&src, PixelFormat::Mono, &palette, ConversionFlags::default())
            .unwrap();
        assert_eq!(out.pixel_index(2, 0), 1);
        assert_eq!(out.pixel_index(0, 0), 0);
        assert_eq!(out.pixel(2, 0), rgb(0, 0, 0));
    }

    #[test]
    fn test_convert_with_palette_rejects_bad_palette() {
        let src = Image::new(2, 2, PixelFormat::Argb32).unwrap();
        assert!(convert_with_palette(&src, PixelFormat::Indexed8, &[], ConversionFlags::default())
            .is_err());
        let too_big = vec![0u32; 257];
        assert!(convert_with_palette(
            &src,
            PixelFormat::Indexed8,
            &too_big,
            ConversionFlags::default()
        )
        .is_err());
    }
}
