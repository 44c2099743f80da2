//! Frame acquisition and decoding module
//!
//! Sources yield encoded frames one at a time; decoders turn them into a
//! [`PixelGrid`] the height processor can read.

mod decoder;
mod source;
mod image_decoder;
mod rgba_decoder;
mod raw_decoder;
mod directory_source;
mod ffmpeg_source;
pub mod types;

pub use decoder::FrameDecoder;
pub use source::FrameSource;
pub use image_decoder::ImageFrameDecoder;
pub use rgba_decoder::RgbaFrameDecoder;
pub use raw_decoder::RawFrameDecoder;
pub use directory_source::DirectoryFrameSource;
pub use ffmpeg_source::FfmpegFrameSource;
pub use types::{PixelGrid, Rgba};
