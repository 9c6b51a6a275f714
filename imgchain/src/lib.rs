pub mod bitmap;
pub mod image;
pub mod item;
pub mod options;
pub mod pipeline;
pub mod processor;

// Re-export commonly used types
pub use bitmap::{Bitmap, Frame, Size};
pub use item::ProcessItem;
pub use options::ProcessOptions;
pub use pipeline::{Pipeline, ProcessorSpec};
pub use processor::{
    chain, Chain, DefaultProcessor, Processor, ProcessorExt, RoundCornerProcessor,
};
