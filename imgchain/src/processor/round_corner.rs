use anyhow::Result;
use imageproc::image::DynamicImage;

use crate::bitmap::{Bitmap, Size};
use crate::image::{fit, mask_rounded_corners};
use crate::item::ProcessItem;
use crate::options::ProcessOptions;

use super::{chain, DefaultProcessor, Processor};

/// Fits a bitmap into a size and clips its four corners to a radius.
///
/// Without a target size the bitmap's intrinsic size, converted to points
/// with the bitmap's own scale, is used. Both the size and the radius are
/// logical and get multiplied by the scale factor, so a bitmap already at
/// that scale keeps its pixel size. Raw data is decoded by
/// [`DefaultProcessor`] first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundCornerProcessor {
    corner_radius: f32,
    target_size: Option<Size>,
}

impl RoundCornerProcessor {
    pub fn new(corner_radius: f32) -> Self {
        Self {
            corner_radius,
            target_size: None,
        }
    }

    pub fn with_target_size(mut self, target_size: Size) -> Self {
        self.target_size = Some(target_size);
        self
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    pub fn target_size(&self) -> Option<Size> {
        self.target_size
    }

    // negative and non-finite radii clip nothing
    fn effective_radius(&self) -> f32 {
        if self.corner_radius.is_finite() && self.corner_radius > 0.0 {
            self.corner_radius
        } else {
            0.0
        }
    }

    fn round(&self, bitmap: &Bitmap, scale: f32) -> Result<Bitmap> {
        // a degenerate target size means no resize, not an error
        let size = match self.target_size {
            Some(size) if !size.is_degenerate() => size,
            _ => bitmap.logical_size(),
        };
        anyhow::ensure!(!size.is_degenerate(), "Bitmap has no pixels");

        let (width, height) = size.to_pixels(scale);
        let mut output = fit(bitmap.largest_representation(), width, height)?;
        mask_rounded_corners(&mut output, self.effective_radius() * scale);

        Ok(Bitmap::new(DynamicImage::ImageRgba8(output), scale))
    }
}

impl Processor for RoundCornerProcessor {
    fn process(&self, item: ProcessItem, options: &ProcessOptions) -> Option<Bitmap> {
        options.validate().ok()?;

        match item {
            ProcessItem::Image(bitmap) => self.round(&bitmap, options.scale_factor).ok(),
            ProcessItem::Data(data) => {
                chain(DefaultProcessor, *self).process(ProcessItem::Data(data), options)
            }
        }
    }

    fn identifier(&self) -> String {
        match self.target_size {
            Some(size) => format!(
                "round-corner:radius={},size={}x{}",
                self.corner_radius, size.width, size.height
            ),
            None => format!("round-corner:radius={}", self.corner_radius),
        }
    }
}

#[cfg(test)]
mod tests {
    use imageproc::image::{GenericImageView, Rgba, RgbaImage};

    use super::*;
    use crate::processor::testing::{png_bytes, solid_bitmap};
    use crate::processor::ProcessorExt;

    fn alpha_at(bitmap: &Bitmap, x: u32, y: u32) -> u8 {
        bitmap.image().get_pixel(x, y)[3]
    }

    #[test]
    fn defaults_to_intrinsic_size() {
        let processor = RoundCornerProcessor::new(4.0);
        let bitmap = solid_bitmap(40, 30);

        let at_1x = processor
            .process(ProcessItem::Image(bitmap.clone()), &ProcessOptions::new(1.0))
            .unwrap();
        let at_2x = processor
            .process(ProcessItem::Image(bitmap), &ProcessOptions::new(2.0))
            .unwrap();

        assert_eq!(at_1x.dimensions(), (40, 30));
        assert_eq!(at_2x.dimensions(), (80, 60));
        assert_eq!(at_2x.scale(), 2.0);
    }

    #[test]
    fn intrinsic_size_respects_bitmap_scale() {
        let processor = RoundCornerProcessor::new(4.0);
        let bitmap = DefaultProcessor
            .process(ProcessItem::Data(png_bytes(40, 30)), &ProcessOptions::new(2.0))
            .unwrap();

        let same_scale = processor
            .process(ProcessItem::Image(bitmap.clone()), &ProcessOptions::new(2.0))
            .unwrap();
        let lower_scale = processor
            .process(ProcessItem::Image(bitmap), &ProcessOptions::new(1.0))
            .unwrap();

        assert_eq!(same_scale.dimensions(), (40, 30));
        assert_eq!(lower_scale.dimensions(), (20, 15));
    }

    #[test]
    fn repeated_rounding_keeps_size() {
        let options = ProcessOptions::new(2.0);
        let once = DefaultProcessor.append(RoundCornerProcessor::new(1.0));
        let twice = once.append(RoundCornerProcessor::new(1.0));

        let data = png_bytes(10, 10);
        let once = once.process(ProcessItem::Data(data.clone()), &options).unwrap();
        let twice = twice.process(ProcessItem::Data(data), &options).unwrap();

        assert_eq!(once.dimensions(), (10, 10));
        assert_eq!(twice.dimensions(), (10, 10));
    }

    #[test]
    fn target_size_resizes_and_clips() {
        let processor = RoundCornerProcessor::new(5.0).with_target_size(Size::new(20.0, 10.0));
        let result = processor
            .process(ProcessItem::Image(solid_bitmap(64, 64)), &ProcessOptions::new(1.0))
            .unwrap();

        assert_eq!(result.dimensions(), (20, 10));
        assert_eq!(alpha_at(&result, 0, 0), 0);
        assert_eq!(alpha_at(&result, 19, 9), 0);
        assert!(alpha_at(&result, 10, 5) > 0);
    }

    #[test]
    fn intrinsic_size_spans_all_representations() {
        let wide = DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 10, Rgba([1, 1, 1, 255])));
        let tall = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 20, Rgba([1, 1, 1, 255])));
        let bitmap = Bitmap::with_representations(vec![wide, tall], 1.0).unwrap();

        let result = RoundCornerProcessor::new(2.0)
            .process(ProcessItem::Image(bitmap), &ProcessOptions::new(1.0))
            .unwrap();

        assert_eq!(result.dimensions(), (30, 20));
    }

    #[test]
    fn zero_radius_matches_plain_fit() {
        let bitmap = solid_bitmap(16, 12);
        let processor = RoundCornerProcessor::new(0.0).with_target_size(Size::new(8.0, 6.0));

        let result = processor
            .process(ProcessItem::Image(bitmap.clone()), &ProcessOptions::new(1.0))
            .unwrap();
        let fitted = fit(bitmap.image(), 8, 6).unwrap();

        assert_eq!(result.image(), &DynamicImage::ImageRgba8(fitted));
        assert!(alpha_at(&result, 0, 0) > 0);
    }

    #[test]
    fn negative_radius_behaves_like_zero() {
        let bitmap = solid_bitmap(10, 10);
        let options = ProcessOptions::new(1.0);

        assert_eq!(
            RoundCornerProcessor::new(-3.0).process(ProcessItem::Image(bitmap.clone()), &options),
            RoundCornerProcessor::new(0.0).process(ProcessItem::Image(bitmap), &options)
        );
    }

    #[test]
    fn degenerate_target_size_falls_back_to_intrinsic() {
        let processor = RoundCornerProcessor::new(2.0).with_target_size(Size::new(0.0, 50.0));
        let result = processor
            .process(ProcessItem::Image(solid_bitmap(12, 7)), &ProcessOptions::new(1.0))
            .unwrap();

        assert_eq!(result.dimensions(), (12, 7));
    }

    #[test]
    fn data_equals_decode_then_round() {
        let processor = RoundCornerProcessor::new(3.0);
        let options = ProcessOptions::new(2.0);
        let data = png_bytes(10, 8);

        let direct = processor.process(ProcessItem::Data(data.clone()), &options);
        let manual = DefaultProcessor
            .append(processor)
            .process(ProcessItem::Data(data), &options);

        assert!(direct.is_some());
        assert_eq!(direct, manual);
        assert_eq!(direct.map(|b| b.dimensions()), Some((10, 8)));
    }

    #[test]
    fn undecodable_data_declines() {
        let result = RoundCornerProcessor::new(3.0)
            .process(ProcessItem::Data(b"GIF89a garbage".to_vec()), &ProcessOptions::default());

        assert!(result.is_none());
    }

    #[test]
    fn input_bitmap_is_left_alone() {
        let bitmap = solid_bitmap(10, 10);
        let original = bitmap.clone();
        let processor = RoundCornerProcessor::new(4.0);

        let _ = processor.process(ProcessItem::Image(bitmap.clone()), &ProcessOptions::default());

        assert_eq!(bitmap, original);
    }

    #[test]
    fn identifiers_distinguish_configuration() {
        assert_eq!(RoundCornerProcessor::new(5.0).identifier(), "round-corner:radius=5");
        assert_eq!(
            RoundCornerProcessor::new(2.5)
                .with_target_size(Size::new(64.0, 32.0))
                .identifier(),
            "round-corner:radius=2.5,size=64x32"
        );
        assert_ne!(RoundCornerProcessor::new(5.0), RoundCornerProcessor::new(10.0));
    }
}
