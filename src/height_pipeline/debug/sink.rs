use std::path::Path;

use crate::height_pipeline::common::error::Result;

/// Grayscale visualization of a frame's clipped deviation profiles.
///
/// Dark pixels are close to the laser color; everything past the deviation
/// threshold is white.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugImage {
    pub width: usize,
    pub height: usize,
    /// One value per column per row, row-major
    pub data: Vec<u16>,
}

impl DebugImage {
    pub fn from_profiles(width: usize, profiles: Vec<Vec<u16>>) -> Self {
        let height = profiles.len();
        Self {
            width,
            height,
            data: profiles.concat(),
        }
    }
}

pub trait DebugSink {
    fn write_debug(&self, image: &DebugImage, path: &Path) -> Result<()>;
}
