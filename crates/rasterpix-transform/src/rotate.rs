//! Orthogonal rotations
//!
//! Quarter-turn rotations by whole-element moves: no resampling, no
//! precision loss. The byte-width-specialized routines walk the source
//! in tiles so both the source read and the transposed write stay
//! cache-friendly; 1-bit images go through a per-bit fallback.

use crate::error::TransformResult;
use crate::mirror::mirrored;
use rasterpix_core::{Image, PixelFormat};

const TILE: usize = 32;

#[derive(Clone, Copy, PartialEq)]
enum Turn {
    /// 90 degrees clockwise: (x, y) -> (h-1-y, x)
    Cw,
    /// 90 degrees counterclockwise: (x, y) -> (y, w-1-x)
    Ccw,
}

fn rotate_elements(
    src: &[u8],
    sstride: usize,
    w: usize,
    h: usize,
    bpp: usize,
    dst: &mut [u8],
    dstride: usize,
    turn: Turn,
) {
    let mut ty = 0;
    while ty < h {
        let yend = (ty + TILE).min(h);
        let mut tx = 0;
        while tx < w {
            let xend = (tx + TILE).min(w);
            for y in ty..yend {
                for x in tx..xend {
                    let (nx, ny) = match turn {
                        Turn::Cw => (h - 1 - y, x),
                        Turn::Ccw => (y, w - 1 - x),
                    };
                    let s = y * sstride + x * bpp;
                    let d = ny * dstride + nx * bpp;
                    dst[d..d + bpp].copy_from_slice(&src[s..s + bpp]);
                }
            }
            tx = xend;
        }
        ty = yend;
    }
}

fn rotate_bits(
    src: &[u8],
    sstride: usize,
    w: usize,
    h: usize,
    lsb: bool,
    dst: &mut [u8],
    dstride: usize,
    turn: Turn,
) {
    for y in 0..h {
        let srow = &src[y * sstride..];
        for x in 0..w {
            let bit = if lsb {
                (srow[x >> 3] >> (x & 7)) & 1
            } else {
                (srow[x >> 3] >> (7 - (x & 7))) & 1
            };
            if bit == 0 {
                continue;
            }
            let (nx, ny) = match turn {
                Turn::Cw => (h - 1 - y, x),
                Turn::Ccw => (y, w - 1 - x),
            };
            let mask = if lsb { 1u8 << (nx & 7) } else { 0x80u8 >> (nx & 7) };
            dst[ny * dstride + (nx >> 3)] |= mask;
        }
    }
}

fn rotated_quarter(image: &Image, turn: Turn) -> TransformResult<Image> {
    if image.is_null() {
        return Ok(Image::null());
    }
    let w = image.width();
    let h = image.height();
    let format = image.format();
    let mut out = Image::new(h, w, format)?;
    if let Some(t) = image.color_table() {
        out.set_color_table(t.entries());
    }
    let sstride = image.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = image.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
    match format.depth() {
        1 => rotate_bits(
            src_bytes,
            sstride,
            w as usize,
            h as usize,
            format == PixelFormat::MonoLsb,
            dst_bytes,
            dstride,
            turn,
        ),
        depth => rotate_elements(
            src_bytes,
            sstride,
            w as usize,
            h as usize,
            (depth / 8) as usize,
            dst_bytes,
            dstride,
            turn,
        ),
    }
    Ok(out)
}

/// Rotate 90 degrees clockwise. The result is `h x w`.
pub fn rotated_90(image: &Image) -> TransformResult<Image> {
    rotated_quarter(image, Turn::Cw)
}

/// Rotate 180 degrees: a mirror in both axes.
pub fn rotated_180(image: &Image) -> TransformResult<Image> {
    Ok(mirrored(image, true, true))
}

/// Rotate 270 degrees clockwise (90 counterclockwise).
pub fn rotated_270(image: &Image) -> TransformResult<Image> {
    rotated_quarter(image, Turn::Ccw)
}

/// Rotate by `quads` quarter turns clockwise.
pub fn rotated_orth(image: &Image, quads: u32) -> TransformResult<Image> {
    match quads % 4 {
        0 => Ok(image.clone()),
        1 => rotated_90(image),
        2 => rotated_180(image),
        _ => rotated_270(image),
    }
}
