//! Mask extraction
//!
//! Collapses the alpha channel or an exact color match into a 1-bit
//! mask image. Masks come out `MonoLsb` with a set bit meaning "in".

use crate::dither::dither_to_mono;
use crate::dispatch::convert_to_format;
use crate::error::ConvertResult;
use crate::flags::ConversionFlags;
use rasterpix_core::{Image, InvertMode, PixelFormat};

/// Which side of a color match becomes opaque in the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskMode {
    /// Pixels matching the color are set in the mask
    #[default]
    MaskInColor,
    /// Pixels matching the color are cleared in the mask
    MaskOutColor,
}

/// Build a 1-bit mask from the alpha channel.
///
/// Opaque pixels become set bits; the alpha dithering mode in `flags`
/// decides how partial coverage collapses. Returns the null image for a
/// null source or one without any alpha (an `Rgb32` image has none by
/// definition).
pub fn create_alpha_mask(src: &Image, flags: ConversionFlags) -> ConvertResult<Image> {
    if src.is_null() || src.format() == PixelFormat::Rgb32 {
        return Ok(Image::null());
    }
    if src.depth() == 1 {
        // a monochrome image with translucent table entries; go the
        // long way through Indexed8
        let indexed = convert_to_format(src, PixelFormat::Indexed8, flags)?;
        return create_alpha_mask(&indexed, flags);
    }
    let src = match src.format() {
        PixelFormat::Indexed8 | PixelFormat::Argb32 => src.clone(),
        _ => convert_to_format(src, PixelFormat::Argb32, flags)?,
    };
    let mask = dither_to_mono(&src, PixelFormat::MonoLsb, flags, true)?;
    Ok(mask)
}

/// Build a 1-bit mask of the pixels that exactly match `color` (ARGB).
pub fn create_mask_from_color(src: &Image, color: u32, mode: MaskMode) -> ConvertResult<Image> {
    if src.is_null() {
        return Ok(Image::null());
    }
    let w = src.width();
    let h = src.height();
    let mut mask = Image::new(w, h, PixelFormat::MonoLsb)?;
    mask.fill(0);
    {
        let stride = mask.stride() as usize;
        let Some(bytes) = mask.bits_mut() else { return Ok(Image::null()) };
        for y in 0..h {
            let row = &mut bytes[y as usize * stride..];
            for x in 0..w {
                if src.pixel(x, y) == color {
                    row[(x >> 3) as usize] |= 1 << (x & 7);
                }
            }
        }
    }
    if mode == MaskMode::MaskOutColor {
        mask.invert_pixels(InvertMode::Rgb);
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterpix_core::argb::{rgb, rgba};

    #[test]
    fn test_alpha_mask_from_argb32() {
        let mut src = Image::new(8, 1, PixelFormat::Argb32).unwrap();
        src.fill_color(rgba(0, 0, 0, 255));
        src.set_pixel(3, 0, rgba(0, 0, 0, 0));
        let mask = create_alpha_mask(&src, ConversionFlags::threshold()).unwrap();
        assert_eq!(mask.format(), PixelFormat::MonoLsb);
        assert_eq!(mask.pixel_index(0, 0), 1);
        assert_eq!(mask.pixel_index(3, 0), 0);
    }

    #[test]
    fn test_alpha_mask_of_rgb32_is_null() {
        let src = Image::new(2, 2, PixelFormat::Rgb32).unwrap();
        assert!(create_alpha_mask(&src, ConversionFlags::default()).unwrap().is_null());
    }

    #[test]
    fn test_mask_from_color() {
        let mut src = Image::new(4, 1, PixelFormat::Rgb32).unwrap();
        src.fill_color(rgb(1, 2, 3));
        src.set_pixel(2, 0, rgb(9, 9, 9));
        let mask = create_mask_from_color(&src, rgb(9, 9, 9), MaskMode::MaskInColor).unwrap();
        assert_eq!(mask.pixel_index(2, 0), 1);
        assert_eq!(mask.pixel_index(0, 0), 0);
        let inv = create_mask_from_color(&src, rgb(9, 9, 9), MaskMode::MaskOutColor).unwrap();
        assert_eq!(inv.pixel_index(2, 0), 0);
        assert_eq!(inv.pixel_index(0, 0), 1);
    }
}
