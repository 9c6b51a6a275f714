//! Image services the processors lean on: decoding, resizing, corner masking and encoding

mod decode;
mod encode;
mod transform;

pub use decode::decode;
pub(crate) use decode::decode_frames;
pub use encode::{compress_to_jpeg, compress_to_png, compress_to_webp, encode, OutputFormat};
pub use transform::{fit, mask_rounded_corners};
