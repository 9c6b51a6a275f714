//! The processor capability and the combinator that chains processors together

mod chain;
mod default;
mod round_corner;

pub use chain::{chain, Chain};
pub use default::DefaultProcessor;
pub use round_corner::RoundCornerProcessor;

use std::sync::Arc;

use crate::bitmap::Bitmap;
use crate::item::ProcessItem;
use crate::options::ProcessOptions;

/// Turns a [`ProcessItem`] into a bitmap.
///
/// `None` means the processor could not or would not produce a result for
/// this input. Implementations must be pure: same item and options, same
/// bitmap, and no side effects.
pub trait Processor: Send + Sync {
    fn process(&self, item: ProcessItem, options: &ProcessOptions) -> Option<Bitmap>;

    /// Stable key for this processor's configuration, used to tell cached results apart
    fn identifier(&self) -> String;
}

pub trait ProcessorExt: Processor + Sized {
    /// Run `self`, then feed its bitmap to `next`
    fn append<B: Processor>(self, next: B) -> Chain<Self, B> {
        Chain::new(self, next)
    }

    fn boxed(self) -> Box<dyn Processor>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<P: Processor> ProcessorExt for P {}

impl<P: Processor + ?Sized> Processor for &P {
    fn process(&self, item: ProcessItem, options: &ProcessOptions) -> Option<Bitmap> {
        (**self).process(item, options)
    }

    fn identifier(&self) -> String {
        (**self).identifier()
    }
}

impl<P: Processor + ?Sized> Processor for Box<P> {
    fn process(&self, item: ProcessItem, options: &ProcessOptions) -> Option<Bitmap> {
        (**self).process(item, options)
    }

    fn identifier(&self) -> String {
        (**self).identifier()
    }
}

impl<P: Processor + ?Sized> Processor for Arc<P> {
    fn process(&self, item: ProcessItem, options: &ProcessOptions) -> Option<Bitmap> {
        (**self).process(item, options)
    }

    fn identifier(&self) -> String {
        (**self).identifier()
    }
}
