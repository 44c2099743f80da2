use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::height_pipeline::common::error::{ProcessorError, Result};
use crate::height_pipeline::debug::sink::{DebugImage, DebugSink};

/// Writes debug images as 16-bit grayscale TIFF files, replacing existing files.
pub struct TiffDebugSink;

impl DebugSink for TiffDebugSink {
    fn write_debug(&self, image: &DebugImage, path: &Path) -> Result<()> {
        debug!(
            "Encoding debug TIFF {}x{} to {}",
            image.width,
            image.height,
            path.display()
        );

        if image.width == 0 || image.height == 0 {
            return Err(ProcessorError::SinkError(format!(
                "cannot encode an empty {}x{} image",
                image.width, image.height
            )));
        }

        let file = File::create(path)
            .map_err(|e| ProcessorError::SinkError(format!("{}: {}", path.display(), e)))?;

        let mut encoder = tiff::encoder::TiffEncoder::new(BufWriter::new(file))
            .map_err(|e| ProcessorError::SinkError(e.to_string()))?;

        encoder
            .write_image::<tiff::encoder::colortype::Gray16>(
                image.width as u32,
                image.height as u32,
                &image.data,
            )
            .map_err(|e| ProcessorError::SinkError(e.to_string()))?;

        debug!("Debug TIFF written");
        Ok(())
    }
}
