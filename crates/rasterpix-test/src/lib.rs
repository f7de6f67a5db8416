//! rasterpix-test - Regression test harness
//!
//! A small accumulator for regression tests: each comparison is
//! numbered, failures are recorded and reported together, and
//! `cleanup()` returns the overall verdict for the final assert.
//!
//! ```ignore
//! use rasterpix_test::RegParams;
//!
//! let mut rp = RegParams::new("rotate");
//! rp.compare_values(20.0, rotated.width() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! The module also provides a few deterministic image builders shared
//! by the integration tests.

mod params;

pub use params::RegParams;

use rasterpix_core::{Image, PixelFormat, argb};

/// A horizontal/vertical RGB gradient test image.
pub fn gradient_image(width: i32, height: i32, format: PixelFormat) -> Image {
    let mut img = Image::new(width, height, format).expect("gradient image");
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            img.set_pixel(x, y, argb::rgb(r, g, 128));
        }
    }
    img
}

/// A two-color checkerboard with `cell`-sized squares.
pub fn checkerboard(width: i32, height: i32, cell: i32, c0: u32, c1: u32) -> Image {
    let mut img = Image::new(width, height, PixelFormat::Argb32).expect("checkerboard image");
    for y in 0..height {
        for x in 0..width {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            img.set_pixel(x, y, if on { c0 } else { c1 });
        }
    }
    img
}

/// An Indexed8 image cycling through a small palette.
pub fn indexed_strips(width: i32, height: i32, palette: &[u32]) -> Image {
    let mut img = Image::new(width, height, PixelFormat::Indexed8).expect("indexed image");
    img.set_color_table(palette);
    for y in 0..height {
        for x in 0..width {
            img.set_pixel(x, y, (x as usize % palette.len()) as u32);
        }
    }
    img
}
