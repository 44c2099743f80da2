//! Decoder for compressed still images (JPEG, PNG, TIFF, ...) backed by the image crate.

use tracing::debug;

use crate::height_pipeline::common::error::{ProcessorError, Result};
use crate::height_pipeline::frame::decoder::FrameDecoder;
use crate::height_pipeline::frame::types::{PixelGrid, Rgba};

pub struct ImageFrameDecoder;

impl FrameDecoder for ImageFrameDecoder {
    fn decode(&self, data: &[u8]) -> Result<PixelGrid> {
        debug!("Decoding compressed frame, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| ProcessorError::DecodeError(e.to_string()))?;

        // 8-bit sources are widened to 16 bits by byte replication
        let rgba = decoded.to_rgba16();
        let (width, height) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|p| Rgba::new(p.0[0], p.0[1], p.0[2], p.0[3]))
            .collect();

        debug!("Decoded frame: {}x{}", width, height);

        PixelGrid::new(width as usize, height as usize, pixels)
    }
}
