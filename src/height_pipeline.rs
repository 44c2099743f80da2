//! Laser line height pipeline
//!
//! Reconstructs per-row surface height from frames showing one or two projected
//! laser lines. Each row is scored against the laser color, the resulting
//! deviation profile is searched for troughs, and the trough spacing is converted
//! to millimeters with the calibration's `pixel_per_mm`.

pub mod common;
pub mod frame;
pub mod options;
pub mod profile;
pub mod height;
pub mod debug;
pub mod processing;

pub use common::{
    ProcessorError,
    Result,
};

pub use frame::{
    DirectoryFrameSource,
    FfmpegFrameSource,
    FrameDecoder,
    FrameSource,
    ImageFrameDecoder,
    PixelGrid,
    RawFrameDecoder,
    Rgba,
    RgbaFrameDecoder,
};

pub use options::{
    AmbiguousRowPolicy,
    CalibrationResults,
    DebugOptions,
    LineDirection,
    ProcessorOptions,
    ProcessorOptionsBuilder,
};

pub use profile::ColorMetric;

pub use height::{
    AMBIGUOUS_HEIGHT,
    HeightMap,
    RowHeight,
};

pub use debug::{
    DebugImage,
    DebugSink,
    TiffDebugSink,
};

pub use processing::{
    FrameOutcome,
    FrameReport,
    HeightProcessor,
    VideoHeightPipeline,
    compute_heights,
};
