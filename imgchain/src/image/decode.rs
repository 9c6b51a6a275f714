//! Image decoding

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use imageproc::image::codecs::gif::GifDecoder;
use imageproc::image::{
    guess_format, load_from_memory_with_format, AnimationDecoder, DynamicImage, ImageFormat,
};

use crate::bitmap::{Animation, Bitmap, Frame};

/// Decode an encoded buffer into a bitmap rendered at `scale`.
///
/// GIFs keep their animation. With `preload_all_frames` every frame is
/// decoded now, otherwise only the first one is and the rest are decoded
/// from the retained bytes when asked for.
pub fn decode(data: &[u8], scale: f32, preload_all_frames: bool) -> Result<Bitmap> {
    anyhow::ensure!(!data.is_empty(), "Cannot decode an empty buffer");

    let format = guess_format(data).context("Unrecognized image format")?;
    match format {
        ImageFormat::Gif => decode_gif(data, scale, preload_all_frames),
        format => {
            let img = load_from_memory_with_format(data, format)
                .with_context(|| format!("Failed to decode {format:?} image"))?;
            Ok(Bitmap::new(img, scale))
        }
    }
}

fn decode_gif(data: &[u8], scale: f32, preload_all_frames: bool) -> Result<Bitmap> {
    if preload_all_frames {
        let mut frames = decode_frames(data)?;
        anyhow::ensure!(!frames.is_empty(), "GIF contains no frames");

        if frames.len() == 1 {
            let frame = frames.swap_remove(0);
            return Ok(Bitmap::new(DynamicImage::ImageRgba8(frame.image), scale));
        }

        let first = DynamicImage::ImageRgba8(frames[0].image.clone());
        return Ok(Bitmap::animated(first, scale, Animation::Preloaded(frames)));
    }

    let decoder = GifDecoder::new(Cursor::new(data)).context("Failed to read GIF header")?;
    let mut frames = decoder.into_frames();
    let first = frames.next().context("GIF contains no frames")??;
    let first = DynamicImage::ImageRgba8(first.into_buffer());

    // Peeking composites the second frame in full, and frames() later decodes
    // it again. image's GIF decoder gives no way to count frames more cheaply.
    if frames.next().is_none() {
        return Ok(Bitmap::new(first, scale));
    }

    Ok(Bitmap::animated(
        first,
        scale,
        Animation::Deferred(Arc::from(data)),
    ))
}

/// Decode every frame of a GIF
pub(crate) fn decode_frames(data: &[u8]) -> Result<Vec<Frame>> {
    let decoder = GifDecoder::new(Cursor::new(data)).context("Failed to read GIF header")?;

    decoder
        .into_frames()
        .map(|frame| -> Result<Frame> {
            let frame = frame.context("Failed to decode GIF frame")?;
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_ms = if denom == 0 { 0 } else { numer / denom };
            Ok(Frame {
                image: frame.into_buffer(),
                delay: Duration::from_millis(delay_ms as u64),
            })
        })
        .collect()
}
