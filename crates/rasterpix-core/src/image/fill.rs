//! Whole-image fill and pixel inversion

use super::Image;
use crate::format::PixelFormat;
use crate::packed::{self, write_raw};
use std::sync::Arc;
use tracing::warn;

/// Channel selection for [`Image::invert_pixels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvertMode {
    /// Invert RGB, leave alpha untouched (32-bit formats only)
    #[default]
    Rgb,
    /// Invert RGB and alpha
    Rgba,
}

impl Image {
    /// Fill the whole image with a raw pixel value.
    ///
    /// The value is a palette index for indexed formats and a packed
    /// pixel word otherwise, truncated to the format depth. For the
    /// opaque 32-bit formats the unused alpha byte is forced to 0xff.
    /// Detaches.
    pub fn fill(&mut self, value: u32) {
        if !self.begin_mutate() {
            return;
        }
        let Some(d) = self.d.as_mut().and_then(Arc::get_mut) else { return };
        let width = d.buffer.width() as usize;
        let depth = d.format.depth();
        let value = match d.format {
            PixelFormat::Rgb32 | PixelFormat::Rgbx8888 => value | 0xff00_0000,
            _ if depth < 32 => value & ((1u32 << depth) - 1).max(1),
            _ => value,
        };
        match depth {
            1 => {
                let byte = if value & 1 != 0 { 0xffu8 } else { 0 };
                let used = width.div_ceil(8);
                for y in 0..d.buffer.height() {
                    d.buffer.row_mut(y)[..used].fill(byte);
                }
            }
            8 => {
                for y in 0..d.buffer.height() {
                    d.buffer.row_mut(y)[..width].fill(value as u8);
                }
            }
            16 | 24 | 32 => {
                let bpp = (depth / 8) as usize;
                for y in 0..d.buffer.height() {
                    let row = d.buffer.row_mut(y);
                    for x in 0..width {
                        write_raw(row, x * bpp, bpp, value);
                    }
                }
            }
            _ => {}
        }
    }

    /// Fill with an ARGB color, mapped into the image's format.
    ///
    /// Indexed formats use the exact matching table entry; a missing
    /// color is appended when the table has room, otherwise index 0 is
    /// used with a warning.
    pub fn fill_color(&mut self, color: u32) {
        if self.is_null() {
            return;
        }
        let format = self.format();
        if format.is_indexed() {
            let entries = self.color_table().map(|t| t.entries().to_vec()).unwrap_or_default();
            let index = match entries.iter().position(|&c| c == color) {
                Some(i) => i,
                None if entries.len() < (1usize << format.depth()) => {
                    let i = entries.len();
                    self.set_color(i, color);
                    i
                }
                None => {
                    warn!(color, "fill_color: color not in table and table is full");
                    0
                }
            };
            self.fill(index as u32);
        } else {
            self.fill(packed::argb_to_raw(format, color));
        }
    }

    /// Invert the pixel bits.
    ///
    /// For 32-bit formats `mode` selects whether alpha inverts too; for
    /// narrower formats all used bits invert, including palette indices
    /// of indexed images (the table is untouched). Detaches.
    pub fn invert_pixels(&mut self, mode: InvertMode) {
        if !self.begin_mutate() {
            return;
        }
        let Some(d) = self.d.as_mut().and_then(Arc::get_mut) else { return };
        let width = d.buffer.width() as usize;
        let depth = d.format.depth();
        if depth != 32 {
            let used = (width * depth as usize).div_ceil(8);
            for y in 0..d.buffer.height() {
                for b in &mut d.buffer.row_mut(y)[..used] {
                    *b = !*b;
                }
            }
        } else {
            // in a little-endian raw word both host-order ARGB and
            // byte-ordered RGBA keep their color bits in the low 24
            let xor = match mode {
                InvertMode::Rgb => 0x00ff_ffffu32,
                InvertMode::Rgba => 0xffff_ffffu32,
            };
            for y in 0..d.buffer.height() {
                let row = d.buffer.row_mut(y);
                for x in 0..width {
                    let v = packed::read_raw(row, x * 4, 4) ^ xor;
                    write_raw(row, x * 4, 4, v);
                }
            }
        }
    }
}
