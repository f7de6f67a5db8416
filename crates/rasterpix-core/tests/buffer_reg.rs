//! Buffer size invariant regression test
//!
//! For every valid (width, height, format), creation either fails or
//! yields a stride that is 4-byte aligned, at least as wide as the
//! pixel row, with byte_count = stride * height.

use rasterpix_core::{Image, PixelFormat};
use rasterpix_test::RegParams;

#[test]
fn buffer_reg() {
    let mut rp = RegParams::new("buffer");

    let formats = [
        PixelFormat::Mono,
        PixelFormat::MonoLsb,
        PixelFormat::Indexed8,
        PixelFormat::Rgb16,
        PixelFormat::Rgb555,
        PixelFormat::Rgb888,
        PixelFormat::Argb8565Premultiplied,
        PixelFormat::Rgb32,
        PixelFormat::Argb32,
        PixelFormat::Rgba8888,
    ];

    for format in formats {
        for w in [1, 2, 3, 7, 8, 9, 31, 32, 33, 100, 255] {
            for h in [1, 2, 5, 64] {
                let img = Image::new(w, h, format).expect("create");
                let stride = img.stride();
                let min_row = ((w as i64 * format.depth() as i64) as u64).div_ceil(8) as i64;

                rp.check("stride aligned", stride % 4 == 0);
                rp.check("stride covers row", i64::from(stride) >= min_row);
                rp.compare_values(
                    (stride as usize * h as usize) as f64,
                    img.byte_count() as f64,
                    0.0,
                );
            }
        }
    }

    // oversized images fail cleanly instead of truncating
    rp.check("overflow rejected", Image::new(i32::MAX, 2, PixelFormat::Argb32).is_err());
    rp.check(
        "overflow rejected",
        Image::new(1 << 20, 1 << 20, PixelFormat::Argb32).is_err(),
    );
    rp.check("zero width rejected", Image::new(0, 5, PixelFormat::Rgb32).is_err());
    rp.check("invalid format rejected", Image::new(5, 5, PixelFormat::Invalid).is_err());

    assert!(rp.cleanup(), "buffer regression test failed");
}
