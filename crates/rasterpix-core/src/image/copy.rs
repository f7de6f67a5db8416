//! Whole-image and sub-rectangle copies
//!
//! `copy` produces a deep, detached duplicate. A sub-rectangle may
//! reach outside the source; uncovered pixels are left at the zero
//! fill, which resolves to black for `Rgb32`, transparent black for
//! the alpha formats, palette index 0 for indexed images and color 0
//! for 1-bit images.

use super::{Image, ImageData};
use crate::buffer::PixelBuffer;
use crate::format::PixelFormat;
use crate::geom::Rect;

impl Image {
    /// Deep-copy `r` into a new image of exactly `r`'s size.
    ///
    /// A null rect copies the whole image. Allocation failure yields
    /// the null image, never a partial copy.
    pub fn copy(&self, r: Rect) -> Image {
        let Some(d) = &self.d else { return Image::null() };

        if r.is_null() || r == self.rect() {
            let Ok(buffer) = d.buffer.duplicate(d.format) else {
                return Image::null();
            };
            let mut data = ImageData::new(buffer, d.format, d.color_table.clone());
            self.copy_metadata_to(&mut data);
            return Image::from_data(data);
        }

        let Ok(buffer) = PixelBuffer::create(r.width, r.height, d.format) else {
            return Image::null();
        };
        let mut data = ImageData::new(buffer, d.format, d.color_table.clone());
        self.copy_metadata_to(&mut data);
        let mut image = Image::from_data(data);

        let mut x = r.x;
        let mut y = r.y;
        let mut dx = 0;
        let mut dy = 0;
        if x < 0 || y < 0 || r.right() > d.buffer.width() || r.bottom() > d.buffer.height() {
            // the blit will not cover the whole destination
            image.fill(0);
            if x < 0 {
                dx = -x;
                x = 0;
            }
            if y < 0 {
                dy = -y;
                y = 0;
            }
        }

        let mut pixels_to_copy = (r.width - dx).max(0);
        if x > d.buffer.width() {
            pixels_to_copy = 0;
        } else {
            pixels_to_copy = pixels_to_copy.min(d.buffer.width() - x);
        }
        let mut lines_to_copy = (r.height - dy).max(0);
        if y > d.buffer.height() {
            lines_to_copy = 0;
        } else {
            lines_to_copy = lines_to_copy.min(d.buffer.height() - y);
        }

        let depth = d.format.depth();
        let byte_aligned = !matches!(d.format, PixelFormat::Mono | PixelFormat::MonoLsb)
            || (dx & 7 == 0 && x & 7 == 0 && pixels_to_copy & 7 == 0);

        {
            let dst = image.d.as_mut().and_then(std::sync::Arc::get_mut);
            let Some(dst) = dst else { return Image::null() };
            if byte_aligned {
                let src_off = ((x as usize * depth as usize) >> 3, y);
                let dst_off = ((dx as usize * depth as usize) >> 3, dy);
                let bytes_to_copy = (pixels_to_copy as usize * depth as usize) >> 3;
                for i in 0..lines_to_copy {
                    let src_row = d.buffer.row(src_off.1 + i);
                    let dst_row = dst.buffer.row_mut(dst_off.1 + i);
                    dst_row[dst_off.0..dst_off.0 + bytes_to_copy]
                        .copy_from_slice(&src_row[src_off.0..src_off.0 + bytes_to_copy]);
                }
            } else {
                // partial-byte slice of a 1-bit image: move single bits
                // without disturbing their neighbors
                let lsb_first = d.format == PixelFormat::MonoLsb;
                for i in 0..lines_to_copy {
                    let src_row = d.buffer.row(y + i);
                    let dst_row = dst.buffer.row_mut(dy + i);
                    for j in 0..pixels_to_copy {
                        let sx = (x + j) as usize;
                        let tx = (dx + j) as usize;
                        let (smask, tmask) = if lsb_first {
                            (1u8 << (sx & 7), 1u8 << (tx & 7))
                        } else {
                            (0x80u8 >> (sx & 7), 0x80u8 >> (tx & 7))
                        };
                        if src_row[sx >> 3] & smask != 0 {
                            dst_row[tx >> 3] |= tmask;
                        } else {
                            dst_row[tx >> 3] &= !tmask;
                        }
                    }
                }
            }
        }
        image
    }
}
