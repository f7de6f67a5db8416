//! Monochrome dithering
//!
//! Collapses an 8-bit indexed or 32-bit image to one bit per pixel. A
//! set bit means ink: the output table is {index 0 = white, index 1 =
//! black}, and when dithering the alpha channel a set bit means opaque.
//!
//! Three modes: mid-point threshold, ordered dithering against the
//! 16x16 Bayer matrix, and single-pass Floyd-Steinberg error diffusion
//! with weights 7/16 right, 5/16 below, 3/16 below-left, 1/16
//! below-right, carried in two rotating row buffers.

use crate::error::{ConvertError, ConvertResult};
use crate::flags::{AlphaDitherMode, ConversionFlags, DitherMode};
use rasterpix_core::packed::read_raw;
use rasterpix_core::{Image, PixelFormat, argb};

/// 16x16 ordered dithering matrix.
pub const BAYER_MATRIX: [[u8; 16]; 16] = [
    [0x01, 0xc0, 0x30, 0xf0, 0x0c, 0xcc, 0x3c, 0xfc, 0x03, 0xc3, 0x33, 0xf3, 0x0f, 0xcf, 0x3f, 0xff],
    [0x80, 0x40, 0xb0, 0x70, 0x8c, 0x4c, 0xbc, 0x7c, 0x83, 0x43, 0xb3, 0x73, 0x8f, 0x4f, 0xbf, 0x7f],
    [0x20, 0xe0, 0x10, 0xd0, 0x2c, 0xec, 0x1c, 0xdc, 0x23, 0xe3, 0x13, 0xd3, 0x2f, 0xef, 0x1f, 0xdf],
    [0xa0, 0x60, 0x90, 0x50, 0xac, 0x6c, 0x9c, 0x5c, 0xa3, 0x63, 0x93, 0x53, 0xaf, 0x6f, 0x9f, 0x5f],
    [0x08, 0xc8, 0x38, 0xf8, 0x04, 0xc4, 0x34, 0xf4, 0x0b, 0xcb, 0x3b, 0xfb, 0x07, 0xc7, 0x37, 0xf7],
    [0x88, 0x48, 0xb8, 0x78, 0x84, 0x44, 0xb4, 0x74, 0x8b, 0x4b, 0xbb, 0x7b, 0x87, 0x47, 0xb7, 0x77],
    [0x28, 0xe8, 0x18, 0xd8, 0x24, 0xe4, 0x14, 0xd4, 0x2b, 0xeb, 0x1b, 0xdb, 0x27, 0xe7, 0x17, 0xd7],
    [0xa8, 0x68, 0x98, 0x58, 0xa4, 0x64, 0x94, 0x54, 0xab, 0x6b, 0x9b, 0x5b, 0xa7, 0x67, 0x97, 0x57],
    [0x02, 0xc2, 0x32, 0xf2, 0x0e, 0xce, 0x3e, 0xfe, 0x01, 0xc1, 0x31, 0xf1, 0x0d, 0xcd, 0x3d, 0xfd],
    [0x82, 0x42, 0xb2, 0x72, 0x8e, 0x4e, 0xbe, 0x7e, 0x81, 0x41, 0xb1, 0x71, 0x8d, 0x4d, 0xbd, 0x7d],
    [0x22, 0xe2, 0x12, 0xd2, 0x2e, 0xee, 0x1e, 0xde, 0x21, 0xe1, 0x11, 0xd1, 0x2d, 0xed, 0x1d, 0xdd],
    [0xa2, 0x62, 0x92, 0x52, 0xae, 0x6e, 0x9e, 0x5e, 0xa1, 0x61, 0x91, 0x51, 0xad, 0x6d, 0x9d, 0x5d],
    [0x0a, 0xca, 0x3a, 0xfa, 0x06, 0xc6, 0x36, 0xf6, 0x09, 0xc9, 0x39, 0xf9, 0x05, 0xc5, 0x35, 0xf5],
    [0x8a, 0x4a, 0xba, 0x7a, 0x86, 0x46, 0xb6, 0x76, 0x89, 0x49, 0xb9, 0x79, 0x85, 0x45, 0xb5, 0x75],
    [0x2a, 0xea, 0x1a, 0xda, 0x26, 0xe6, 0x16, 0xd6, 0x29, 0xe9, 0x19, 0xd9, 0x25, 0xe5, 0x15, 0xd5],
    [0xaa, 0x6a, 0x9a, 0x5a, 0xa6, 0x66, 0x96, 0x56, 0xa9, 0x69, 0x99, 0x59, 0xa5, 0x65, 0x95, 0x55],
];

/// Per-byte bit-reversal table, for MSB-first / LSB-first swaps.
pub const BITFLIP: [u8; 256] = {
    let mut t = [0u8; 256];
    let mut i = 0usize;
    while i < 256 {
        t[i] = (i as u8).reverse_bits();
        i += 1;
    }
    t
};

enum Mode {
    Threshold,
    Ordered,
    Diffuse,
}

/// Dither `src` down to one bit per pixel.
///
/// `format` selects `Mono` or `MonoLsb` output. With `from_alpha` the
/// source alpha channel is dithered instead of the luminance (opaque
/// becomes a set bit). The source must be `Indexed8` or a host-order
/// 32-bit format; the dispatch layer pivots everything else through
/// `Argb32` first.
pub fn dither_to_mono(
    src: &Image,
    format: PixelFormat,
    flags: ConversionFlags,
    from_alpha: bool,
) -> ConvertResult<Image> {
    debug_assert!(matches!(format, PixelFormat::Mono | PixelFormat::MonoLsb));
    if src.is_null() {
        return Ok(Image::null());
    }
    let src_format = src.format();
    let depth = src_format.depth();
    if depth != 8 && depth != 32 {
        return Err(ConvertError::UnsupportedConversion { from: src_format, to: format });
    }

    let w = src.width();
    let h = src.height();
    let mut out = Image::new(w, h, format)?;
    out.clone_metadata_from(src);
    out.set_color_table(&[0xffff_ffff, 0xff00_0000]);

    let mode = if from_alpha {
        match flags.alpha_dither {
            AlphaDitherMode::Diffuse => Mode::Diffuse,
            AlphaDitherMode::Ordered => Mode::Ordered,
            AlphaDitherMode::Threshold => Mode::Threshold,
        }
    } else {
        match flags.color_dither {
            DitherMode::Threshold => Mode::Threshold,
            DitherMode::Ordered => Mode::Ordered,
            DitherMode::Diffuse => Mode::Diffuse,
        }
    };

    // intensity map for 8-bit sources; identity ramp without a table
    let mut gray = [0u8; 256];
    if depth == 8 {
        for (i, g) in gray.iter_mut().enumerate() {
            let entry = match src.color_table() {
                Some(t) if !t.is_empty() => t.entry_clamped(i),
                _ => argb::rgb(i as u8, i as u8, i as u8),
            };
            *g = if from_alpha { 255 - argb::alpha(entry) } else { argb::gray(entry) };
        }
    }

    let intensity = |row: &[u8], x: usize| -> i32 {
        if depth == 8 {
            gray[row[x] as usize] as i32
        } else {
            let p = read_raw(row, x * 4, 4);
            if from_alpha {
                255 - (p >> 24) as i32
            } else {
                argb::gray(p) as i32
            }
        }
    };

    let w_us = w as usize;
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits().to_vec();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };

    match mode {
        Mode::Diffuse => {
            let mut line1 = vec![0i32; w_us];
            let mut line2 = vec![0i32; w_us];
            for (x, v) in line2.iter_mut().enumerate() {
                *v = intensity(&src_bytes[0..sstride], x);
            }
            for y in 0..h as usize {
                std::mem::swap(&mut line1, &mut line2);
                let not_last = y + 1 < h as usize;
                if not_last {
                    let row = &src_bytes[(y + 1) * sstride..(y + 2) * sstride];
                    for (x, v) in line2.iter_mut().enumerate() {
                        *v = intensity(row, x);
                    }
                }
                let drow = &mut dst_bytes[y * dstride..(y + 1) * dstride];
                for x in 0..w_us {
                    let err = if line1[x] < 128 {
                        drow[x >> 3] |= 0x80 >> (x & 7);
                        line1[x]
                    } else {
                        line1[x] - 255
                    };
                    if x + 1 < w_us {
                        line1[x + 1] += (err * 7) >> 4;
                    }
                    if not_last {
                        line2[x] += (err * 5) >> 4;
                        if x > 0 {
                            line2[x - 1] += (err * 3) >> 4;
                        }
                        if x + 1 < w_us {
                            line2[x + 1] += err >> 4;
                        }
                    }
                }
            }
        }
        Mode::Ordered => {
            for y in 0..h as usize {
                let srow = &src_bytes[y * sstride..(y + 1) * sstride];
                let drow = &mut dst_bytes[y * dstride..(y + 1) * dstride];
                for x in 0..w_us {
                    let threshold = BAYER_MATRIX[x & 15][y & 15] as i32;
                    let ink = if from_alpha && depth == 32 {
                        let a = (read_raw(srow, x * 4, 4) >> 24) as i32;
                        a >= threshold
                    } else {
                        // intensity() already folds alpha inversion in
                        // for 8-bit sources
                        let v = if from_alpha { 255 - intensity(srow, x) } else { intensity(srow, x) };
                        if from_alpha { v >= threshold } else { v < threshold }
                    };
                    if ink {
                        drow[x >> 3] |= 0x80 >> (x & 7);
                    }
                }
            }
        }
        Mode::Threshold => {
            for y in 0..h as usize {
                let srow = &src_bytes[y * sstride..(y + 1) * sstride];
                let drow = &mut dst_bytes[y * dstride..(y + 1) * dstride];
                for x in 0..w_us {
                    let ink = if from_alpha && depth == 32 {
                        (read_raw(srow, x * 4, 4) >> 24) >= 128
                    } else {
                        intensity(srow, x) < 128
                    };
                    if ink {
                        drow[x >> 3] |= 0x80 >> (x & 7);
                    }
                }
            }
        }
    }

    if format == PixelFormat::MonoLsb {
        let used = (w as usize).div_ceil(8);
        for y in 0..h as usize {
            for b in &mut dst_bytes[y * dstride..y * dstride + used] {
                *b = BITFLIP[*b as usize];
            }
        }
    }

    Ok(out)
}
