use crate::height_pipeline::common::error::Result;
use crate::height_pipeline::frame::decoder::FrameDecoder;
use crate::height_pipeline::frame::types::PixelGrid;

/// Wraps uncompressed RGBA8 frame buffers of a known size, as produced by a
/// video stream decoded to `rawvideo`.
#[derive(Debug, Clone, Copy)]
pub struct RgbaFrameDecoder {
    pub width: usize,
    pub height: usize,
}

impl RgbaFrameDecoder {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn frame_len(&self) -> usize {
        self.width * self.height * 4
    }
}

impl FrameDecoder for RgbaFrameDecoder {
    fn decode(&self, data: &[u8]) -> Result<PixelGrid> {
        PixelGrid::from_rgba8(self.width, self.height, data)
    }
}
