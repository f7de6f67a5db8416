//! Matrix transform regression test
//!
//! Bounding-box sizing, identity sharing, mirror scenarios and format
//! promotion under complex transforms.

use rasterpix_core::{Image, PixelFormat, argb};
use rasterpix_test::{RegParams, checkerboard};
use rasterpix_transform::{Transform, TransformMode, mirrored, transformed, true_matrix};

#[test]
fn identity_reg() {
    let mut rp = RegParams::new("identity");

    // transforming 1x1 by the identity must hand back the same buffer
    let img = Image::new(1, 1, PixelFormat::Rgb32).unwrap();
    let out = transformed(&img, &Transform::identity(), TransformMode::Fast).unwrap();
    rp.check("same cell", out.shares_data_with(&img));
    rp.compare_values(img.cache_key() as f64, out.cache_key() as f64, 0.0);

    // a bare translation is also absorbed by the true matrix
    let out = transformed(&img, &Transform::from_translate(40.0, -3.0), TransformMode::Fast).unwrap();
    rp.check("translation absorbed", out.shares_data_with(&img));

    assert!(rp.cleanup(), "identity regression test failed");
}

#[test]
fn bounding_box_reg() {
    let mut rp = RegParams::new("bounding_box");

    // P5: 10x20 rotated 90 degrees is exactly 20x10
    let img = Image::new(10, 20, PixelFormat::Argb32).unwrap();
    let out = transformed(&img, &Transform::from_rotate(90.0), TransformMode::Fast).unwrap();
    rp.compare_values(20.0, out.width() as f64, 0.0);
    rp.compare_values(10.0, out.height() as f64, 0.0);

    // the true matrix maps the source rect onto the origin
    let t = true_matrix(&Transform::from_rotate(90.0), 10, 20).unwrap();
    let mapped = t.map_rect(rasterpix_core::Rect::new(0, 0, 10, 20));
    rp.compare_values(0.0, mapped.x as f64, 0.0);
    rp.compare_values(0.0, mapped.y as f64, 0.0);

    // 45 degrees: bounding box of the rotated corners, no cropping
    let sq = Image::new(10, 10, PixelFormat::Argb32).unwrap();
    let out = transformed(&sq, &Transform::from_rotate(45.0), TransformMode::Fast).unwrap();
    let expect = (10.0 * std::f64::consts::SQRT_2).ceil();
    rp.compare_values(expect, out.width() as f64, 1.0);
    rp.compare_values(expect, out.height() as f64, 1.0);

    assert!(rp.cleanup(), "bounding box regression test failed");
}

#[test]
fn mirror_scenario_reg() {
    let mut rp = RegParams::new("mirror_scenario");

    // a uniform 4x4 indexed image is unchanged by mirroring while its
    // geometry stays intact
    let mut img = Image::new(4, 4, PixelFormat::Indexed8).unwrap();
    img.set_color_table(&[argb::rgb(255, 0, 0), argb::rgb(0, 0, 255)]);
    img.fill(0);

    let m = mirrored(&img, true, false);
    rp.compare_images(&m, &img);
    rp.compare_values(4.0, m.width() as f64, 0.0);
    rp.compare_values(4.0, m.stride() as f64, 0.0);

    // a non-uniform image flips back to itself
    let board = checkerboard(9, 5, 2, argb::rgb(0, 0, 0), argb::rgb(255, 255, 255));
    let back = mirrored(&mirrored(&board, true, true), true, true);
    rp.compare_images(&back, &board);

    assert!(rp.cleanup(), "mirror scenario regression test failed");
}

#[test]
fn promotion_reg() {
    let mut rp = RegParams::new("promotion");

    // opaque formats gain premultiplied alpha under a rotation that
    // exposes background
    for (from, to) in [
        (PixelFormat::Rgb32, PixelFormat::Argb32Premultiplied),
        (PixelFormat::Rgb16, PixelFormat::Argb8565Premultiplied),
        (PixelFormat::Rgb555, PixelFormat::Argb8555Premultiplied),
        (PixelFormat::Rgb666, PixelFormat::Argb6666Premultiplied),
        (PixelFormat::Rgb444, PixelFormat::Argb4444Premultiplied),
        (PixelFormat::Rgbx8888, PixelFormat::Rgba8888Premultiplied),
    ] {
        let mut img = Image::new(6, 6, from).unwrap();
        img.fill_color(argb::rgb(255, 255, 255));
        let out = transformed(&img, &Transform::from_rotate(30.0), TransformMode::Fast).unwrap();
        rp.check("promoted", out.format() == to);
        rp.check("corner transparent", argb::alpha(out.pixel(0, 0)) == 0);
    }

    // alpha-carrying sources keep their format
    let img = Image::new(6, 6, PixelFormat::Argb32).unwrap();
    let out = transformed(&img, &Transform::from_rotate(30.0), TransformMode::Fast).unwrap();
    rp.check("argb32 kept", out.format() == PixelFormat::Argb32);

    assert!(rp.cleanup(), "promotion regression test failed");
}

#[test]
fn rotation_content_reg() {
    let mut rp = RegParams::new("rotation_content");

    // rotating a solid square by 45 degrees keeps the center solid and
    // the corners background
    let mut img = Image::new(12, 12, PixelFormat::Argb32).unwrap();
    img.fill_color(argb::rgb(0, 128, 255));
    let out = transformed(&img, &Transform::from_rotate(45.0), TransformMode::Fast).unwrap();
    let cx = out.width() / 2;
    let cy = out.height() / 2;
    rp.check("center solid", out.pixel(cx, cy) == argb::rgb(0, 128, 255));
    rp.compare_values(0.0, out.pixel(0, 0) as f64, 0.0);
    rp.compare_values(0.0, out.pixel(out.width() - 1, out.height() - 1) as f64, 0.0);

    // smooth mode blends the edge
    let smooth = transformed(&img, &Transform::from_rotate(45.0), TransformMode::Smooth).unwrap();
    let mut partial = 0;
    for y in 0..smooth.height() {
        for x in 0..smooth.width() {
            let a = argb::alpha(smooth.pixel(x, y));
            if a > 0 && a < 255 {
                partial += 1;
            }
        }
    }
    rp.check("antialiased edge", partial > 0);

    assert!(rp.cleanup(), "rotation content regression test failed");
}
