//! Mirroring
//!
//! Horizontal and/or vertical reflection. Byte-deep formats reverse
//! whole elements; 1-bit rows are mirrored by reversing byte order,
//! bit-reversing each byte, and then shifting the row back into place
//! when the width is not a byte multiple.

use rasterpix_convert::BITFLIP;
use rasterpix_core::{Image, PixelFormat};

/// Return a mirror of `image`.
///
/// A null image, a 1x1 image, or no-op flags return a shared clone.
/// The color table, its alpha flag and the device pixel ratio carry
/// over.
pub fn mirrored(image: &Image, horizontal: bool, vertical: bool) -> Image {
    if image.is_null() {
        return Image::null();
    }
    let w = image.width();
    let h = image.height();
    if (w <= 1 && h <= 1) || (!horizontal && !vertical) {
        return image.clone();
    }

    let format = image.format();
    let Ok(mut out) = Image::new(w, h, format) else {
        return Image::null();
    };
    if let Some(t) = image.color_table() {
        out.set_color_table(t.entries());
        if t.has_alpha() {
            out.force_alpha_clut();
        }
    }
    out.set_device_pixel_ratio(image.device_pixel_ratio());

    let depth = format.depth();
    // 1-bit rows move as whole bytes; the bit pass below finishes the
    // horizontal case
    let (elems, bpp) = if depth == 1 {
        ((w as usize).div_ceil(8), 1usize)
    } else {
        (w as usize, (depth / 8) as usize)
    };

    let sstride = image.stride() as usize;
    let dstride = out.stride() as usize;
    let src_bytes = image.bits();
    let Some(dst_bytes) = out.bits_mut() else { return Image::null() };

    for sy in 0..h as usize {
        let dy = if vertical { h as usize - 1 - sy } else { sy };
        let srow = &src_bytes[sy * sstride..];
        let drow = &mut dst_bytes[dy * dstride..];
        if horizontal {
            for sx in 0..elems {
                let dx = elems - 1 - sx;
                drow[dx * bpp..(dx + 1) * bpp].copy_from_slice(&srow[sx * bpp..(sx + 1) * bpp]);
            }
        } else {
            drow[..elems * bpp].copy_from_slice(&srow[..elems * bpp]);
        }
    }

    if horizontal && depth == 1 {
        mirror_bitmap_rows(
            w as usize,
            h as usize,
            elems,
            dst_bytes,
            dstride,
            format == PixelFormat::MonoLsb,
        );
    }
    out
}

/// Finish a horizontal 1-bit mirror: the bytes of each row are already
/// reversed; reverse the bits inside each byte and shift the row when
/// the width is not a multiple of 8.
fn mirror_bitmap_rows(
    w: usize,
    h: usize,
    used: usize,
    data: &mut [u8],
    stride: usize,
    lsb_first: bool,
) {
    let shift = w % 8;
    for y in 0..h {
        let row = &mut data[y * stride..y * stride + used];
        for b in row.iter_mut() {
            *b = BITFLIP[*b as usize];
        }
        if shift != 0 {
            let mut carry = 0u8;
            if lsb_first {
                for b in row.iter_mut().rev() {
                    let next = *b << shift;
                    *b = (*b >> (8 - shift)) | carry;
                    carry = next;
                }
            } else {
                for b in row.iter_mut().rev() {
                    let next = *b >> shift;
                    *b = (*b << (8 - shift)) | carry;
                    carry = next;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterpix_core::argb::rgb;

    #[test]
    fn test_horizontal_mirror_32bpp() {
        let mut src = Image::new(3, 1, PixelFormat::Argb32).unwrap();
        src.set_pixel(0, 0, rgb(1, 0, 0));
        src.set_pixel(1, 0, rgb(2, 0, 0));
        src.set_pixel(2, 0, rgb(3, 0, 0));
        let out = mirrored(&src, true, false);
        assert_eq!(out.pixel(0, 0), rgb(3, 0, 0));
        assert_eq!(out.pixel(2, 0), rgb(1, 0, 0));
    }

    #[test]
    fn test_vertical_mirror_24bpp() {
        let mut src = Image::new(2, 3, PixelFormat::Rgb888).unwrap();
        for y in 0..3 {
            src.set_pixel(0, y, rgb(y as u8, 0, 0));
            src.set_pixel(1, y, rgb(y as u8, 1, 0));
        }
        let out = mirrored(&src, false, true);
        for y in 0..3 {
            assert_eq!(out.pixel(0, y), src.pixel(0, 2 - y));
            assert_eq!(out.pixel(1, y), src.pixel(1, 2 - y));
        }
    }

    #[test]
    fn test_mirror_involution_all_depths() {
        for format in [
            PixelFormat::Argb32,
            PixelFormat::Rgb888,
            PixelFormat::Rgb16,
            PixelFormat::Indexed8,
        ] {
            let mut src = Image::new(5, 4, format).unwrap();
            if format == PixelFormat::Indexed8 {
                src.set_color_table(&(0..8).map(|i| rgb(i as u8, 0, 0)).collect::<Vec<_>>());
                for y in 0..4 {
                    for x in 0..5 {
                        src.set_pixel(x, y, ((x + y) % 8) as u32);
                    }
                }
            } else {
                for y in 0..4 {
                    for x in 0..5 {
                        src.set_pixel(x, y, rgb(x as u8 * 40, y as u8 * 60, 0));
                    }
                }
            }
            let back = mirrored(&mirrored(&src, true, false), true, false);
            assert_eq!(back, src, "{format:?}");
        }
    }

    #[test]
    fn test_mono_unaligned_width_mirror() {
        // width 10: exercises the sub-byte shift fix-up
        let mut src = Image::new(10, 2, PixelFormat::Mono).unwrap();
        src.fill(0);
        src.set_pixel(0, 0, 1);
        src.set_pixel(3, 0, 1);
        src.set_pixel(9, 1, 1);
        let out = mirrored(&src, true, false);
        assert_eq!(out.pixel_index(9, 0), 1);
        assert_eq!(out.pixel_index(6, 0), 1);
        assert_eq!(out.pixel_index(0, 1), 1);
        assert_eq!(out.pixel_index(5, 0), 0);
        let back = mirrored(&out, true, false);
        assert_eq!(back, src);
    }

    #[test]
    fn test_monolsb_mirror() {
        let mut src = Image::new(11, 1, PixelFormat::MonoLsb).unwrap();
        src.fill(0);
        src.set_pixel(1, 0, 1);
        src.set_pixel(10, 0, 1);
        let out = mirrored(&src, true, false);
        assert_eq!(out.pixel_index(9, 0), 1);
        assert_eq!(out.pixel_index(0, 0), 1);
        let back = mirrored(&out, true, false);
        assert_eq!(back, src);
    }

    #[test]
    fn test_both_axes_equals_180() {
        let mut src = Image::new(3, 2, PixelFormat::Argb32).unwrap();
        for y in 0..2 {
            for x in 0..3 {
                src.set_pixel(x, y, rgb(x as u8, y as u8, 9));
            }
        }
        let out = mirrored(&src, true, true);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(out.pixel(x, y), src.pixel(2 - x, 1 - y));
            }
        }
    }

    #[test]
    fn test_noop_shares_data() {
        let src = Image::new(4, 4, PixelFormat::Rgb32).unwrap();
        let out = mirrored(&src, false, false);
        assert!(out.shares_data_with(&src));
    }
}
