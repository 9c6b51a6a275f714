use crate::bitmap::Bitmap;
use crate::item::ProcessItem;
use crate::options::ProcessOptions;

use super::Processor;

/// Two processors run back to back.
///
/// `first` sees the original item. Its bitmap, if any, goes to `second` as
/// [`ProcessItem::Image`]. When `first` declines, `second` is never called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chain<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

/// Compose `first` and `second` into one processor
pub fn chain<A: Processor, B: Processor>(first: A, second: B) -> Chain<A, B> {
    Chain::new(first, second)
}

impl<A: Processor, B: Processor> Processor for Chain<A, B> {
    fn process(&self, item: ProcessItem, options: &ProcessOptions) -> Option<Bitmap> {
        let intermediate = self.first.process(item, options)?;
        self.second.process(ProcessItem::Image(intermediate), options)
    }

    fn identifier(&self) -> String {
        format!("{}|>{}", self.first.identifier(), self.second.identifier())
    }
}
