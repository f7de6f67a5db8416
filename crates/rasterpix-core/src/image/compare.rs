//! Image equality
//!
//! Two images are equal when they resolve to the same pixels, not when
//! their bytes match: indexed images compare through their color
//! tables, and the undefined top byte of `Rgb32` is masked out.

use super::Image;
use crate::format::PixelFormat;
use std::sync::Arc;

impl PartialEq for Image {
    fn eq(&self, other: &Image) -> bool {
        match (&self.d, &other.d) {
            (None, None) => return true,
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => return true,
            (Some(_), Some(_)) => {}
            _ => return false,
        }
        if self.width() != other.width()
            || self.height() != other.height()
            || self.format() != other.format()
        {
            return false;
        }

        let format = self.format();
        match format {
            PixelFormat::Rgb32 => {
                // alpha byte is undefined, mask it out
                for y in 0..self.height() {
                    let a = self.scan_line(y);
                    let b = other.scan_line(y);
                    for x in 0..self.width() as usize {
                        let pa = u32::from_le_bytes(a[x * 4..x * 4 + 4].try_into().unwrap());
                        let pb = u32::from_le_bytes(b[x * 4..x * 4 + 4].try_into().unwrap());
                        if (pa ^ pb) & 0x00ff_ffff != 0 {
                            return false;
                        }
                    }
                }
                true
            }
            f if f.is_full_color() => {
                // every bit is defined: compare the used bytes per row
                let n = (self.width() as usize * f.depth() as usize) / 8;
                if n as i32 == self.stride() && n as i32 == other.stride() {
                    return self.bits() == other.bits();
                }
                for y in 0..self.height() {
                    if self.scan_line(y)[..n] != other.scan_line(y)[..n] {
                        return false;
                    }
                }
                true
            }
            _ => {
                // indexed: equal when the resolved colors agree, even if
                // the raw indices differ
                for y in 0..self.height() {
                    for x in 0..self.width() {
                        if self.pixel(x, y) != other.pixel(x, y) {
                            return false;
                        }
                    }
                }
                true
            }
        }
    }
}

impl Eq for Image {}
