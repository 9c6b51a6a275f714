//! Image encoding: PNG, JPEG, WebP

use anyhow::{Context, Result};
use imageproc::image::{DynamicImage, ExtendedColorType, GenericImageView};
use webp::WebPMemory;

use crate::bitmap::Bitmap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
    WebP { quality: u8 },
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::WebP { .. } => "webp",
        }
    }
}

/// Compress an image to PNG, keeping its alpha channel
pub fn compress_to_png<W>(img: &DynamicImage, writer: &mut W) -> Result<()>
where
    W: std::io::Write,
{
    use imageproc::image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use imageproc::image::ImageEncoder;

    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);

    encoder
        .write_image(
            img.as_bytes(),
            img.width(),
            img.height(),
            img.color().into(),
        )
        .with_context(|| "Failed to compress image to PNG")?;

    Ok(())
}

/// Compress an image to JPEG with the specified quality. Alpha is dropped.
pub fn compress_to_jpeg<W>(img: &DynamicImage, writer: &mut W, quality: u8) -> Result<()>
where
    W: std::io::Write,
{
    let rgb = img.to_rgb8();
    let mut encoder =
        imageproc::image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality);

    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .with_context(|| "Failed to compress image to JPEG")?;

    Ok(())
}

/// Compress an image to WebP with the specified quality
pub fn compress_to_webp(img: &DynamicImage, quality: u8) -> Result<WebPMemory> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
    Ok(encoder.encode(quality as f32))
}

/// Encode the primary representation of a bitmap
pub fn encode(bitmap: &Bitmap, format: OutputFormat) -> Result<Vec<u8>> {
    let img = bitmap.image();
    let (width, height) = img.dimensions();
    let mut buffer = Vec::with_capacity((width as usize) * (height as usize));

    match format {
        OutputFormat::Png => compress_to_png(img, &mut buffer)?,
        OutputFormat::Jpeg { quality } => compress_to_jpeg(img, &mut buffer, quality)?,
        OutputFormat::WebP { quality } => {
            let webp_data = compress_to_webp(img, quality)?;
            buffer.extend_from_slice(&webp_data);
        }
    }

    Ok(buffer)
}

#[test]
fn png_output_decodes_back_with_alpha() {
    use imageproc::image::{load_from_memory, Rgba, RgbaImage};

    let img = RgbaImage::from_pixel(6, 4, Rgba([1, 2, 3, 0]));
    let bitmap = Bitmap::new(DynamicImage::ImageRgba8(img), 1.0);

    let bytes = encode(&bitmap, OutputFormat::Png).unwrap();
    let decoded = load_from_memory(&bytes).unwrap();

    assert_eq!(decoded.dimensions(), (6, 4));
    assert_eq!(decoded.to_rgba8().get_pixel(0, 0)[3], 0);
}
