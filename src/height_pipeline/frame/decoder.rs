use crate::height_pipeline::common::error::Result;
use crate::height_pipeline::frame::types::PixelGrid;

pub trait FrameDecoder {
    fn decode(&self, data: &[u8]) -> Result<PixelGrid>;
}
