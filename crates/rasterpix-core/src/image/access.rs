//! Pixel access
//!
//! Coordinate-level reads and writes. `pixel` resolves to ARGB through
//! the color table for indexed formats; `set_pixel` takes a palette
//! index for indexed formats and an ARGB word for direct-color ones.
//! Out-of-range coordinates warn and return a zero value rather than
//! panicking.

use super::Image;
use crate::color_table::MONO_TABLE;
use crate::format::PixelFormat;
use crate::packed::{self, read_raw, write_raw};
use std::sync::Arc;
use tracing::warn;

impl Image {
    /// Raw pixel value at `(x, y)`: the palette index for indexed
    /// formats, the packed word otherwise. 0 when out of bounds.
    pub(crate) fn raw_pixel(&self, x: i32, y: i32) -> u32 {
        let Some(d) = &self.d else { return 0 };
        if !self.valid(x, y) {
            return 0;
        }
        let row = d.buffer.row(y);
        let x = x as usize;
        match d.format {
            PixelFormat::Mono => (row[x >> 3] >> (7 - (x & 7))) as u32 & 1,
            PixelFormat::MonoLsb => (row[x >> 3] >> (x & 7)) as u32 & 1,
            PixelFormat::Indexed8 => row[x] as u32,
            _ => {
                let bpp = (d.format.depth() / 8) as usize;
                read_raw(row, x * bpp, bpp)
            }
        }
    }

    pub(crate) fn set_raw_pixel_in(
        format: PixelFormat,
        row: &mut [u8],
        x: usize,
        value: u32,
    ) {
        match format {
            PixelFormat::Mono => {
                let mask = 0x80 >> (x & 7);
                if value & 1 != 0 {
                    row[x >> 3] |= mask;
                } else {
                    row[x >> 3] &= !mask;
                }
            }
            PixelFormat::MonoLsb => {
                let mask = 1 << (x & 7);
                if value & 1 != 0 {
                    row[x >> 3] |= mask;
                } else {
                    row[x >> 3] &= !mask;
                }
            }
            PixelFormat::Indexed8 => row[x] = value as u8,
            _ => {
                let bpp = (format.depth() / 8) as usize;
                write_raw(row, x * bpp, bpp, value);
            }
        }
    }

    /// Color of the pixel at `(x, y)` as a straight-alpha ARGB word.
    ///
    /// Indexed formats resolve through the color table (the default
    /// black/white pair for mono images without one). Out-of-bounds
    /// coordinates warn and return 0.
    pub fn pixel(&self, x: i32, y: i32) -> u32 {
        let Some(d) = &self.d else { return 0 };
        if !self.valid(x, y) {
            warn!(x, y, "pixel: coordinate out of range");
            return 0;
        }
        let raw = self.raw_pixel(x, y);
        match d.format {
            PixelFormat::Mono | PixelFormat::MonoLsb => match &d.color_table {
                Some(t) if !t.is_empty() => t.entry_clamped(raw as usize),
                _ => MONO_TABLE[raw as usize],
            },
            PixelFormat::Indexed8 => match &d.color_table {
                Some(t) if !t.is_empty() => t.entry_clamped(raw as usize),
                // no palette: treat indices as a grayscale ramp
                None | Some(_) => crate::argb::rgb(raw as u8, raw as u8, raw as u8),
            },
            f => packed::raw_to_argb(f, raw),
        }
    }

    /// Palette index of the pixel at `(x, y)`.
    ///
    /// Only meaningful for indexed formats; other formats warn and
    /// return 0.
    pub fn pixel_index(&self, x: i32, y: i32) -> u32 {
        let Some(d) = &self.d else { return 0 };
        if !d.format.is_indexed() {
            warn!(format = ?d.format, "pixel_index: no palette at this depth");
            return 0;
        }
        if !self.valid(x, y) {
            warn!(x, y, "pixel_index: coordinate out of range");
            return 0;
        }
        self.raw_pixel(x, y)
    }

    /// Set the pixel at `(x, y)`.
    ///
    /// For indexed formats `value` is a palette index and must be below
    /// the current color count; for direct-color formats it is a
    /// straight-alpha ARGB word packed into the image's format.
    /// Invalid coordinates or indexes warn and leave the image
    /// untouched. Detaches.
    pub fn set_pixel(&mut self, x: i32, y: i32, value: u32) {
        if self.is_null() {
            return;
        }
        if !self.valid(x, y) {
            warn!(x, y, "set_pixel: coordinate out of range");
            return;
        }
        let format = self.format();
        if format.is_indexed() {
            let count = self.color_count();
            if value as usize >= count.max(if format == PixelFormat::Indexed8 { 0 } else { 2 }) {
                warn!(value, count, "set_pixel: palette index out of range");
                return;
            }
        }
        if !self.begin_mutate() {
            return;
        }
        let Some(d) = self.d.as_mut().and_then(Arc::get_mut) else { return };
        let raw = if format.is_indexed() { value } else { packed::argb_to_raw(format, value) };
        Self::set_raw_pixel_in(format, d.buffer.row_mut(y), x as usize, raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argb::{rgb, rgba};

    #[test]
    fn test_mono_bit_addressing() {
        let mut msb = Image::new(16, 1, PixelFormat::Mono).unwrap();
        msb.set_pixel(0, 0, 1);
        assert_eq!(msb.scan_line(0)[0], 0x80);
        msb.set_pixel(7, 0, 1);
        assert_eq!(msb.scan_line(0)[0], 0x81);

        let mut lsb = Image::new(16, 1, PixelFormat::MonoLsb).unwrap();
        lsb.set_pixel(0, 0, 1);
        assert_eq!(lsb.scan_line(0)[0], 0x01);
        lsb.set_pixel(7, 0, 1);
        assert_eq!(lsb.scan_line(0)[0], 0x81);
        assert_eq!(lsb.pixel_index(7, 0), 1);
        assert_eq!(lsb.pixel_index(6, 0), 0);
    }

    #[test]
    fn test_mono_pixel_resolves_table() {
        let mut img = Image::new(4, 1, PixelFormat::Mono).unwrap();
        img.set_pixel(1, 0, 1);
        // default table: 0 = black, 1 = white
        assert_eq!(img.pixel(0, 0), 0xff00_0000);
        assert_eq!(img.pixel(1, 0), 0xffff_ffff);
    }

    #[test]
    fn test_indexed8_pixel_and_index() {
        let mut img = Image::new(3, 1, PixelFormat::Indexed8).unwrap();
        img.set_color_table(&[rgb(255, 0, 0), rgb(0, 0, 255)]);
        img.set_pixel(2, 0, 1);
        assert_eq!(img.pixel_index(2, 0), 1);
        assert_eq!(img.pixel(2, 0), rgb(0, 0, 255));
        assert_eq!(img.pixel(0, 0), rgb(255, 0, 0));
    }

    #[test]
    fn test_indexed8_rejects_out_of_table_index() {
        let mut img = Image::new(3, 1, PixelFormat::Indexed8).unwrap();
        img.set_color_table(&[rgb(255, 0, 0)]);
        img.set_pixel(0, 0, 5);
        assert_eq!(img.pixel_index(0, 0), 0);
    }

    #[test]
    fn test_argb32_pixel_roundtrip() {
        let mut img = Image::new(2, 2, PixelFormat::Argb32).unwrap();
        let c = rgba(12, 34, 56, 78);
        img.set_pixel(1, 1, c);
        assert_eq!(img.pixel(1, 1), c);
    }

    #[test]
    fn test_rgb16_pixel_packs() {
        let mut img = Image::new(2, 1, PixelFormat::Rgb16).unwrap();
        img.set_pixel(0, 0, rgb(255, 0, 0));
        assert_eq!(img.scan_line(0)[..2], [0x00, 0xf8]);
        assert_eq!(img.pixel(0, 0), rgb(255, 0, 0));
    }

    #[test]
    fn test_rgb888_pixel_bytes() {
        let mut img = Image::new(2, 1, PixelFormat::Rgb888).unwrap();
        img.set_pixel(1, 0, rgb(9, 8, 7));
        assert_eq!(img.scan_line(0)[3..6], [9, 8, 7]);
        assert_eq!(img.pixel(1, 0), rgb(9, 8, 7));
    }

    #[test]
    fn test_out_of_range_reads_zero() {
        let img = Image::new(2, 2, PixelFormat::Argb32).unwrap();
        assert_eq!(img.pixel(5, 5), 0);
        assert_eq!(img.pixel(-1, 0), 0);
    }

    #[test]
    fn test_pixel_index_wrong_depth() {
        let img = Image::new(2, 2, PixelFormat::Rgb32).unwrap();
        assert_eq!(img.pixel_index(0, 0), 0);
    }

    #[test]
    fn test_set_pixel_copy_on_write_isolation() {
        let mut a = Image::new(2, 2, PixelFormat::Argb32).unwrap();
        a.fill(rgb(0, 0, 0));
        let mut b = a.clone();
        b.set_pixel(0, 0, rgb(255, 255, 255));
        assert_eq!(a.pixel(0, 0), rgb(0, 0, 0));
        assert_eq!(b.pixel(0, 0), rgb(255, 255, 255));
        assert!(a.is_detached());
        assert!(b.is_detached());
        assert_ne!(a.bits().as_ptr(), b.bits().as_ptr());
    }
}
