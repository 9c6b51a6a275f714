use crate::bitmap::Bitmap;

/// Input to a processor: either a decoded bitmap or still-encoded bytes
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessItem {
    Image(Bitmap),
    Data(Vec<u8>),
}

impl From<Bitmap> for ProcessItem {
    fn from(bitmap: Bitmap) -> Self {
        ProcessItem::Image(bitmap)
    }
}

impl From<Vec<u8>> for ProcessItem {
    fn from(data: Vec<u8>) -> Self {
        ProcessItem::Data(data)
    }
}
