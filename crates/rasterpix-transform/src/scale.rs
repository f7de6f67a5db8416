//! Scaling
//!
//! `sample_scaled` is plain nearest-neighbor point sampling, usable on
//! every format. `smooth_scaled` is the resampler behind smooth
//! transforms: a separable two-pass filter that box-averages when an
//! axis shrinks and interpolates bilinearly when it grows. It runs on
//! the premultiplied (or opaque) 32-bit formats so that filtering
//! across the alpha edge is well defined; callers convert first.

use crate::error::TransformResult;
use crate::matrix::Transform;
use crate::transformed::{TransformMode, transformed};
use rasterpix_core::packed::{read_raw, write_raw};
use rasterpix_core::{Image, PixelFormat};

/// Nearest-neighbor scale to exactly `w x h`.
pub fn sample_scaled(src: &Image, w: i32, h: i32) -> TransformResult<Image> {
    if src.is_null() || w <= 0 || h <= 0 {
        return Ok(Image::null());
    }
    let sw = src.width();
    let sh = src.height();
    if sw == w && sh == h {
        return Ok(src.clone());
    }
    let format = src.format();
    let mut out = Image::new(w, h, format)?;
    if let Some(t) = src.color_table() {
        out.set_color_table(t.entries());
    }
    let sstride = src.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = src.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };

    let depth = format.depth();
    let lsb = format == PixelFormat::MonoLsb;
    for y in 0..h as usize {
        let sy = (y * sh as usize) / h as usize;
        let srow = &src_bytes[sy * sstride..];
        let drow = &mut dst_bytes[y * dstride..];
        for x in 0..w as usize {
            let sx = (x * sw as usize) / w as usize;
            match depth {
                1 => {
                    let bit = if lsb {
                        (srow[sx >> 3] >> (sx & 7)) & 1
                    } else {
                        (srow[sx >> 3] >> (7 - (sx & 7))) & 1
                    };
                    if bit != 0 {
                        let mask = if lsb { 1u8 << (x & 7) } else { 0x80u8 >> (x & 7) };
                        drow[x >> 3] |= mask;
                    }
                }
                d => {
                    let bpp = (d / 8) as usize;
                    drow[x * bpp..(x + 1) * bpp].copy_from_slice(&srow[sx * bpp..(sx + 1) * bpp]);
                }
            }
        }
    }
    Ok(out)
}

/// Formats the smooth resampler consumes directly.
pub(crate) fn resampler_native(format: PixelFormat) -> bool {
    matches!(
        format,
        PixelFormat::Rgb32
            | PixelFormat::Argb32Premultiplied
            | PixelFormat::Rgbx8888
            | PixelFormat::Rgba8888Premultiplied
    )
}

/// Smoothly scale to exactly `w x h`.
///
/// The source must be one of the resampler-native formats (see
/// [`transformed`] for the conversion policy); the output keeps that
/// format. Each axis independently box-averages on shrink and
/// interpolates on growth, so the filter never reads outside the
/// source.
pub fn smooth_scaled(src: &Image, w: i32, h: i32) -> TransformResult<Image> {
    if src.is_null() || w <= 0 || h <= 0 {
        return Ok(Image::null());
    }
    debug_assert!(resampler_native(src.format()), "convert before resampling");
    let sw = src.width() as usize;
    let sh = src.height() as usize;
    if sw == w as usize && sh == h as usize {
        return Ok(src.clone());
    }
    let dw = w as usize;
    let dh = h as usize;
    let mut out = Image::new(w, h, src.format())?;
    out.clone_metadata_from(src);

    let sstride = src.stride() as usize;
    let src_bytes = src.bits();

    // pass 1: horizontal, into a float lane buffer of dw x sh
    let mut mid = vec![[0f32; 4]; dw * sh];
    for y in 0..sh {
        let srow = &src_bytes[y * sstride..];
        let fetch = |x: usize| -> [f32; 4] {
            let raw = read_raw(srow, x * 4, 4);
            raw.to_le_bytes().map(f32::from)
        };
        let row = &mut mid[y * dw..(y + 1) * dw];
        resample_lane(sw, dw, fetch, row);
    }

    // pass 2: vertical, from the lane buffer into the output rows
    let dstride = out.stride() as usize;
    let Some(dst_bytes) = out.bits_mut() else { return Ok(Image::null()) };
    let mut column = vec![[0f32; 4]; dh];
    for x in 0..dw {
        let fetch = |y: usize| -> [f32; 4] { mid[y * dw + x] };
        resample_lane(sh, dh, fetch, &mut column);
        for (y, lanes) in column.iter().enumerate() {
            let bytes = lanes.map(|v| v.round().clamp(0.0, 255.0) as u8);
            write_raw(&mut dst_bytes[y * dstride..], x * 4, 4, u32::from_le_bytes(bytes));
        }
    }
    Ok(out)
}

/// Resample one lane of `src_len` samples down/up to `dst_len`.
fn resample_lane(
    src_len: usize,
    dst_len: usize,
    fetch: impl Fn(usize) -> [f32; 4],
    out: &mut [[f32; 4]],
) {
    let ratio = src_len as f64 / dst_len as f64;
    if dst_len >= src_len {
        // growing: bilinear at the sample center
        for (i, o) in out.iter_mut().enumerate() {
            let center = (i as f64 + 0.5) * ratio - 0.5;
            let clamped = center.max(0.0);
            let i0 = (clamped as usize).min(src_len - 1);
            let i1 = (i0 + 1).min(src_len - 1);
            let frac = (clamped - i0 as f64) as f32;
            let a = fetch(i0);
            let b = fetch(i1);
            for lane in 0..4 {
                o[lane] = a[lane] + (b[lane] - a[lane]) * frac;
            }
        }
    } else {
        // shrinking: area average over the covered span
        for (i, o) in out.iter_mut().enumerate() {
            let start = i as f64 * ratio;
            let end = (i as f64 + 1.0) * ratio;
            let mut acc = [0f64; 4];
            let mut weight_sum = 0f64;
            let mut pos = start;
            while pos < end - 1e-9 {
                let idx = (pos as usize).min(src_len - 1);
                let next = ((idx + 1) as f64).min(end);
                let weight = next - pos;
                let v = fetch(idx);
                for lane in 0..4 {
                    acc[lane] += v[lane] as f64 * weight;
                }
                weight_sum += weight;
                pos = next;
            }
            for lane in 0..4 {
                o[lane] = if weight_sum > 0.0 { (acc[lane] / weight_sum) as f32 } else { 0.0 };
            }
        }
    }
}

/// Scale with the full transform pipeline: aspect handling, format
/// promotion and mode selection follow [`transformed`].
pub fn scaled(src: &Image, w: i32, h: i32, mode: TransformMode) -> TransformResult<Image> {
    if src.is_null() || w <= 0 || h <= 0 {
        return Ok(Image::null());
    }
    let sx = f64::from(w) / f64::from(src.width());
    let sy = f64::from(h) / f64::from(src.height());
    transformed(src, &Transform::from_scale(sx, sy), mode)
}
