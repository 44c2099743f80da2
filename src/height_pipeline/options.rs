//! Processor options module
//!
//! Configuration, its defaults and the validation run once before a frame is processed.

pub mod types;

pub use types::{
    AmbiguousRowPolicy, CalibrationResults, DEBUG_IMAGE_KEY, DebugOptions, LineDirection,
    ProcessorOptions, ProcessorOptionsBuilder,
};
