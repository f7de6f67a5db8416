//! Packed pixel codecs
//!
//! Raw-value layout of every direct-color format, plus the pack/unpack
//! routines between raw values and canonical ARGB32 words.
//!
//! Raw values of 16- and 24-bit formats are read and written
//! little-endian (low byte first in memory). The 32-bit host-order
//! formats use native `u32` words; the `Rgbx8888` family is defined by
//! byte order (R,G,B,A in memory) and is handled by byte swizzle, not
//! by this table.
//!
//! Channel widening replicates the top bits into the bottom
//! (`x5 -> (x5 << 3) | (x5 >> 2)`), so full-intensity values widen to
//! exactly 255. For the premultiplied formats with 8-bit alpha over
//! narrow color (8565, 8555), widened color channels are clamped to
//! alpha to keep the premultiplication invariant.

use crate::argb;
use crate::format::PixelFormat;

/// Bit-field layout of one packed direct-color format.
#[derive(Debug, Clone, Copy)]
pub struct FieldLayout {
    pub bytes_per_pixel: usize,
    pub r_bits: u32,
    pub r_shift: u32,
    pub g_bits: u32,
    pub g_shift: u32,
    pub b_bits: u32,
    pub b_shift: u32,
    /// 0 bits means no alpha: unpack yields 255, pack drops alpha
    pub a_bits: u32,
    pub a_shift: u32,
    pub premultiplied: bool,
}

const fn fl(
    bytes_per_pixel: usize,
    r: (u32, u32),
    g: (u32, u32),
    b: (u32, u32),
    a: (u32, u32),
    premultiplied: bool,
) -> FieldLayout {
    FieldLayout {
        bytes_per_pixel,
        r_bits: r.0,
        r_shift: r.1,
        g_bits: g.0,
        g_shift: g.1,
        b_bits: b.0,
        b_shift: b.1,
        a_bits: a.0,
        a_shift: a.1,
        premultiplied,
    }
}

impl FieldLayout {
    /// Layout of a packed format; `None` for indexed formats and the
    /// byte-ordered RGBA family.
    pub const fn of(format: PixelFormat) -> Option<FieldLayout> {
        Some(match format {
            PixelFormat::Rgb32 => fl(4, (8, 16), (8, 8), (8, 0), (0, 24), false),
            PixelFormat::Argb32 => fl(4, (8, 16), (8, 8), (8, 0), (8, 24), false),
            PixelFormat::Argb32Premultiplied => fl(4, (8, 16), (8, 8), (8, 0), (8, 24), true),
            PixelFormat::Rgb16 => fl(2, (5, 11), (6, 5), (5, 0), (0, 0), false),
            PixelFormat::Argb8565Premultiplied => fl(3, (5, 19), (6, 13), (5, 8), (8, 0), true),
            PixelFormat::Rgb666 => fl(3, (6, 12), (6, 6), (6, 0), (0, 0), false),
            PixelFormat::Argb6666Premultiplied => fl(3, (6, 12), (6, 6), (6, 0), (6, 18), true),
            PixelFormat::Rgb555 => fl(2, (5, 10), (5, 5), (5, 0), (0, 0), false),
            PixelFormat::Argb8555Premultiplied => fl(3, (5, 18), (5, 13), (5, 8), (8, 0), true),
            PixelFormat::Rgb888 => fl(3, (8, 0), (8, 8), (8, 16), (0, 0), false),
            PixelFormat::Rgb444 => fl(2, (4, 8), (4, 4), (4, 0), (0, 0), false),
            PixelFormat::Argb4444Premultiplied => fl(2, (4, 8), (4, 4), (4, 0), (4, 12), true),
            _ => return None,
        })
    }

    /// Widen an n-bit channel to 8 bits by top-bit replication.
    #[inline]
    const fn widen(v: u32, bits: u32) -> u32 {
        match bits {
            8 => v,
            0 => 255,
            _ => {
                let up = v << (8 - bits);
                up | (up >> bits)
            }
        }
    }

    /// Narrow an 8-bit channel to n bits (truncation, as the packing
    /// hardware would).
    #[inline]
    const fn narrow(v: u32, bits: u32) -> u32 {
        if bits >= 8 { v } else { v >> (8 - bits) }
    }

    /// Unpack a raw value to a straight-alpha ARGB32 word.
    pub fn unpack(&self, raw: u32) -> u32 {
        let mask = |bits: u32| if bits == 0 { 0 } else { (1u32 << bits) - 1 };
        let a = if self.a_bits == 0 {
            255
        } else {
            Self::widen((raw >> self.a_shift) & mask(self.a_bits), self.a_bits)
        };
        let mut r = Self::widen((raw >> self.r_shift) & mask(self.r_bits), self.r_bits);
        let mut g = Self::widen((raw >> self.g_shift) & mask(self.g_bits), self.g_bits);
        let mut b = Self::widen((raw >> self.b_shift) & mask(self.b_bits), self.b_bits);
        if self.premultiplied {
            // color cannot exceed alpha while premultiplied
            r = r.min(a);
            g = g.min(a);
            b = b.min(a);
            return argb::unpremultiply(argb::rgba(r as u8, g as u8, b as u8, a as u8));
        }
        argb::rgba(r as u8, g as u8, b as u8, a as u8)
    }

    /// Pack a straight-alpha ARGB32 word into a raw value.
    pub fn pack(&self, color: u32) -> u32 {
        let c = if self.premultiplied { argb::premultiply(color) } else { color };
        let mut raw = (Self::narrow(argb::red(c) as u32, self.r_bits) << self.r_shift)
            | (Self::narrow(argb::green(c) as u32, self.g_bits) << self.g_shift)
            | (Self::narrow(argb::blue(c) as u32, self.b_bits) << self.b_shift);
        if self.a_bits != 0 {
            raw |= Self::narrow(argb::alpha(c) as u32, self.a_bits) << self.a_shift;
        }
        raw
    }
}

/// Read a raw pixel value of `bytes_per_pixel` bytes at `offset`,
/// little-endian.
#[inline]
pub fn read_raw(bytes: &[u8], offset: usize, bytes_per_pixel: usize) -> u32 {
    match bytes_per_pixel {
        1 => bytes[offset] as u32,
        2 => u16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as u32,
        3 => {
            bytes[offset] as u32 | (bytes[offset + 1] as u32) << 8 | (bytes[offset + 2] as u32) << 16
        }
        4 => u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]),
        _ => unreachable!("bad pixel width"),
    }
}

/// Write a raw pixel value of `bytes_per_pixel` bytes at `offset`,
/// little-endian.
#[inline]
pub fn write_raw(bytes: &mut [u8], offset: usize, bytes_per_pixel: usize, raw: u32) {
    match bytes_per_pixel {
        1 => bytes[offset] = raw as u8,
        2 => bytes[offset..offset + 2].copy_from_slice(&(raw as u16).to_le_bytes()),
        3 => {
            bytes[offset] = raw as u8;
            bytes[offset + 1] = (raw >> 8) as u8;
            bytes[offset + 2] = (raw >> 16) as u8;
        }
        4 => bytes[offset..offset + 4].copy_from_slice(&raw.to_le_bytes()),
        _ => unreachable!("bad pixel width"),
    }
}

/// Unpack one raw pixel of `format` into straight-alpha ARGB32.
///
/// Handles every direct-color format, including the byte-ordered RGBA
/// family; indexed formats have no direct-color meaning here.
pub fn raw_to_argb(format: PixelFormat, raw: u32) -> u32 {
    match format {
        PixelFormat::Rgb32 => 0xff00_0000 | (raw & 0x00ff_ffff),
        PixelFormat::Argb32 => raw,
        PixelFormat::Argb32Premultiplied => argb::unpremultiply(raw),
        PixelFormat::Rgbx8888 | PixelFormat::Rgba8888 | PixelFormat::Rgba8888Premultiplied => {
            // little-endian raw word of R,G,B,A bytes is 0xAABBGGRR
            let [r, g, b, a] = raw.to_le_bytes();
            let a = if format == PixelFormat::Rgbx8888 { 255 } else { a };
            let c = argb::rgba(r, g, b, a);
            if format == PixelFormat::Rgba8888Premultiplied {
                argb::unpremultiply(c)
            } else {
                c
            }
        }
        _ => match FieldLayout::of(format) {
            Some(layout) => layout.unpack(raw),
            None => 0,
        },
    }
}

/// Pack a straight-alpha ARGB32 word into one raw pixel of `format`.
pub fn argb_to_raw(format: PixelFormat, color: u32) -> u32 {
    match format {
        PixelFormat::Rgb32 => 0xff00_0000 | (color & 0x00ff_ffff),
        PixelFormat::Argb32 => color,
        PixelFormat::Argb32Premultiplied => argb::premultiply(color),
        PixelFormat::Rgbx8888 | PixelFormat::Rgba8888 | PixelFormat::Rgba8888Premultiplied => {
            let c = if format == PixelFormat::Rgba8888Premultiplied {
                argb::premultiply(color)
            } else {
                color
            };
            let a = if format == PixelFormat::Rgbx8888 { 255 } else { argb::alpha(c) };
            u32::from_le_bytes([argb::red(c), argb::green(c), argb::blue(c), a])
        }
        _ => match FieldLayout::of(format) {
            Some(layout) => layout.pack(color),
            None => 0,
        },
    }
}
