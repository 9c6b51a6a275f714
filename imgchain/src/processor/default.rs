use crate::bitmap::Bitmap;
use crate::item::ProcessItem;
use crate::options::ProcessOptions;

use super::Processor;

/// Decodes raw data into a bitmap and passes bitmaps through untouched.
///
/// The only built-in stage that understands encoded bytes; every other
/// processor decodes through this one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultProcessor;

impl Processor for DefaultProcessor {
    fn process(&self, item: ProcessItem, options: &ProcessOptions) -> Option<Bitmap> {
        match item {
            ProcessItem::Image(bitmap) => Some(bitmap),
            ProcessItem::Data(data) => {
                options.validate().ok()?;
                crate::image::decode(&data, options.scale_factor, options.preload_all_frames).ok()
            }
        }
    }

    fn identifier(&self) -> String {
        "decode".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use imageproc::image::codecs::gif::GifEncoder;
    use imageproc::image::{Delay, Frame as GifFrame, Rgba, RgbaImage};

    use super::*;
    use crate::processor::testing::{png_bytes, solid_bitmap};

    fn gif_bytes(frame_count: u8) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut encoder = GifEncoder::new(Cursor::new(&mut buffer));
            let frames = (0..frame_count).map(|i| {
                let img = RgbaImage::from_pixel(5, 3, Rgba([i * 40, 0, 0, 255]));
                GifFrame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(100, 1))
            });
            encoder.encode_frames(frames).unwrap();
        }
        buffer
    }

    #[test]
    fn bitmap_passes_through_unchanged() {
        let bitmap = solid_bitmap(7, 3);
        let result = DefaultProcessor.process(
            ProcessItem::Image(bitmap.clone()),
            &ProcessOptions::new(3.0),
        );

        assert_eq!(result, Some(bitmap));
    }

    #[test]
    fn decodes_png_at_scale() {
        let result = DefaultProcessor
            .process(ProcessItem::Data(png_bytes(12, 9)), &ProcessOptions::new(2.0))
            .unwrap();

        assert_eq!(result.dimensions(), (12, 9));
        assert_eq!(result.scale(), 2.0);
        assert!(!result.is_animated());
    }

    #[test]
    fn garbage_and_empty_data_decline() {
        let options = ProcessOptions::default();

        assert!(DefaultProcessor
            .process(ProcessItem::Data(vec![0xde, 0xad, 0xbe, 0xef]), &options)
            .is_none());
        assert!(DefaultProcessor
            .process(ProcessItem::Data(Vec::new()), &options)
            .is_none());

        // valid signature, truncated body
        let mut truncated = png_bytes(12, 9);
        truncated.truncate(20);
        assert!(DefaultProcessor
            .process(ProcessItem::Data(truncated), &options)
            .is_none());
    }

    #[test]
    fn invalid_scale_declines_data() {
        assert!(DefaultProcessor
            .process(ProcessItem::Data(png_bytes(2, 2)), &ProcessOptions::new(0.0))
            .is_none());
    }

    #[test]
    fn preloaded_gif_keeps_every_frame() {
        let options = ProcessOptions::default().with_preload_all_frames(true);
        let bitmap = DefaultProcessor
            .process(ProcessItem::Data(gif_bytes(3)), &options)
            .unwrap();

        assert!(bitmap.is_animated());
        assert_eq!(bitmap.dimensions(), (5, 3));

        let frames = bitmap.frames().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].delay.as_millis(), 100);
    }

    #[test]
    fn lazy_gif_decodes_remaining_frames_on_demand() {
        let options = ProcessOptions::default();
        let lazy = DefaultProcessor
            .process(ProcessItem::Data(gif_bytes(3)), &options)
            .unwrap();
        let eager = DefaultProcessor
            .process(
                ProcessItem::Data(gif_bytes(3)),
                &options.with_preload_all_frames(true),
            )
            .unwrap();

        assert!(lazy.is_animated());
        assert_eq!(lazy.image(), eager.image());
        assert_eq!(lazy.frames().unwrap(), eager.frames().unwrap());
    }

    #[test]
    fn single_frame_gif_is_still() {
        let bitmap = DefaultProcessor
            .process(ProcessItem::Data(gif_bytes(1)), &ProcessOptions::default())
            .unwrap();

        assert!(!bitmap.is_animated());
        assert_eq!(bitmap.dimensions(), (5, 3));
    }
}
