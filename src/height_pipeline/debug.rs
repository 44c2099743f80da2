//! Debug visualization module
//!
//! Optional side channel that persists the clipped deviation profiles of a frame.

mod sink;
mod tiff_sink;

pub use sink::{DebugImage, DebugSink};
pub use tiff_sink::TiffDebugSink;
