//! Bitmap manipulation: exact-size fitting and rounded-corner masking

use anyhow::{Context, Result};
use fast_image_resize as fr;
use fr::images::Image as FrImage;
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::rect::Rect;

// Refuse to allocate outputs beyond this many pixels
const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Stretch `img` to exactly `width` x `height` pixels
pub fn fit(img: &DynamicImage, width: u32, height: u32) -> Result<RgbaImage> {
    anyhow::ensure!(width > 0 && height > 0, "Cannot fit into an empty size");
    anyhow::ensure!(
        width as u64 * height as u64 <= MAX_OUTPUT_PIXELS,
        "Output size {width}x{height} is too large"
    );

    let src = img.to_rgba8();
    let (src_width, src_height) = src.dimensions();
    anyhow::ensure!(src_width > 0 && src_height > 0, "Cannot fit an empty image");

    if (src_width, src_height) == (width, height) {
        return Ok(src);
    }

    let shrinking = (width as u64 * height as u64) < (src_width as u64 * src_height as u64);
    let algorithm = if shrinking {
        // Downscaling: Lanczos3 preserves detail
        fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3)
    } else {
        // Upscaling: CatmullRom gives smoother results
        fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom)
    };

    let src_image = FrImage::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
        .context("Failed to wrap source pixels")?;
    let mut dst_image = FrImage::new(width, height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src_image,
            &mut dst_image,
            Some(&fr::ResizeOptions::new().resize_alg(algorithm)),
        )
        .context("Failed to resize image")?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .context("Resized buffer has an unexpected length")
}

/// Clear every pixel outside a rounded rectangle spanning the whole image.
///
/// `radius` is in pixels and is clamped to half the shorter side. Anything
/// under one pixel leaves the image untouched.
pub fn mask_rounded_corners(img: &mut RgbaImage, radius: f32) {
    let (width, height) = img.dimensions();
    let radius = radius.min(width.min(height) as f32 / 2.0);
    if !(radius >= 1.0) {
        return;
    }

    let r = radius.floor() as i32;
    let (w, h) = (width as i32, height as i32);
    let opaque = Luma([255u8]);
    let mut mask = GrayImage::new(width, height);

    // full-width band between the top and bottom corners
    if h - 2 * r > 0 {
        draw_filled_rect_mut(
            &mut mask,
            Rect::at(0, r).of_size(width, (h - 2 * r) as u32),
            opaque,
        );
    }
    // full-height band between the left and right corners
    if w - 2 * r > 0 {
        draw_filled_rect_mut(
            &mut mask,
            Rect::at(r, 0).of_size((w - 2 * r) as u32, height),
            opaque,
        );
    }
    for center in [(r, r), (w - 1 - r, r), (r, h - 1 - r), (w - 1 - r, h - 1 - r)] {
        draw_filled_circle_mut(&mut mask, center, r, opaque);
    }

    for (pixel, coverage) in img.pixels_mut().zip(mask.pixels()) {
        if coverage[0] == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}
