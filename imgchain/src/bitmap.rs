//! Decoded bitmaps, their pixel-density representations and animation frames

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use imageproc::image::{DynamicImage, GenericImageView, RgbaImage};

/// Logical size in points. Multiply by a scale factor to get pixels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A size with a zero, negative or non-finite side
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
    }

    /// Pixel dimensions of this size rendered at `scale`, never smaller than 1x1
    pub fn to_pixels(self, scale: f32) -> (u32, u32) {
        let width = (self.width * scale).round().max(1.0) as u32;
        let height = (self.height * scale).round().max(1.0) as u32;
        (width, height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image: RgbaImage,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Animation {
    Still,
    /// Every frame was decoded up front
    Preloaded(Vec<Frame>),
    /// Only the first frame was decoded, the rest come from the retained bytes
    Deferred(Arc<[u8]>),
}

/// An in-memory decoded raster.
///
/// A bitmap always holds at least one representation. Extra representations
/// are the same picture at other pixel densities.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    representations: Vec<DynamicImage>,
    scale: f32,
    animation: Animation,
}

impl Bitmap {
    pub fn new(image: DynamicImage, scale: f32) -> Self {
        Self {
            representations: vec![image],
            scale,
            animation: Animation::Still,
        }
    }

    /// Build a bitmap from several density variants, `None` when `representations` is empty
    pub fn with_representations(representations: Vec<DynamicImage>, scale: f32) -> Option<Self> {
        if representations.is_empty() {
            return None;
        }
        Some(Self {
            representations,
            scale,
            animation: Animation::Still,
        })
    }

    pub(crate) fn animated(first_frame: DynamicImage, scale: f32, animation: Animation) -> Self {
        Self {
            representations: vec![first_frame],
            scale,
            animation,
        }
    }

    /// The primary representation
    pub fn image(&self) -> &DynamicImage {
        &self.representations[0]
    }

    pub fn into_image(mut self) -> DynamicImage {
        self.representations.swap_remove(0)
    }

    pub fn representations(&self) -> &[DynamicImage] {
        &self.representations
    }

    /// The representation with the most pixels
    pub fn largest_representation(&self) -> &DynamicImage {
        self.representations
            .iter()
            .max_by_key(|rep| rep.width() as u64 * rep.height() as u64)
            .unwrap_or(&self.representations[0])
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Pixel dimensions of the primary representation
    pub fn dimensions(&self) -> (u32, u32) {
        self.image().dimensions()
    }

    /// Component-wise maximum pixel width and height over all representations
    pub fn intrinsic_size(&self) -> Size {
        self.representations
            .iter()
            .fold(Size::new(0.0, 0.0), |size, rep| {
                Size::new(
                    size.width.max(rep.width() as f32),
                    size.height.max(rep.height() as f32),
                )
            })
    }

    /// Intrinsic size in points, i.e. divided by the scale the bitmap was made at
    pub fn logical_size(&self) -> Size {
        let pixels = self.intrinsic_size();
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        Size::new(pixels.width / scale, pixels.height / scale)
    }

    pub fn is_animated(&self) -> bool {
        !matches!(self.animation, Animation::Still)
    }

    /// All animation frames, decoding deferred ones on demand.
    ///
    /// A still bitmap yields its primary representation as a single frame.
    pub fn frames(&self) -> Result<Vec<Frame>> {
        match &self.animation {
            Animation::Still => Ok(vec![Frame {
                image: self.image().to_rgba8(),
                delay: Duration::ZERO,
            }]),
            Animation::Preloaded(frames) => Ok(frames.clone()),
            Animation::Deferred(data) => crate::image::decode_frames(data),
        }
    }
}
