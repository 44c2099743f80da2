//! Frame processing module
//!
//! Orchestrates profiling, trough detection and height calculation for single
//! frames and for streams of frames.

mod frame_processor;
mod video_pipeline;
mod timing;


pub use frame_processor::{DeviationStats, FrameReport, HeightProcessor, compute_heights};
pub use video_pipeline::{FrameOutcome, VideoHeightPipeline};
pub use timing::{PipelineTimings, StepTiming, Timer};
