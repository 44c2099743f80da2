use std::borrow::Cow;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::height_pipeline::{
    common::error::{ProcessorError, Result},
    debug::{DebugImage, DebugSink, TiffDebugSink},
    frame::{PixelGrid, Rgba},
    height::{HeightMap, RowHeight, row_height},
    options::{AmbiguousRowPolicy, ProcessorOptions},
    profile::{check_trough_width, clip_profile, find_troughs, gaussian_blur, score_row},
};

/// Range of the raw (unclipped) color deviation seen in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviationStats {
    pub min: u16,
    pub max: u16,
}

/// Everything produced for one frame
#[derive(Debug)]
pub struct FrameReport {
    pub heights: HeightMap,
    /// `None` for a frame without pixels
    pub deviation: Option<DeviationStats>,
    pub ambiguous_rows: usize,
    /// Set when the debug image could not be written. The heights are still valid
    pub debug_error: Option<ProcessorError>,
}

struct RowAnalysis {
    height: RowHeight,
    raw_min: u16,
    raw_max: u16,
    profile: Vec<u16>,
}

struct FrameAnalysis {
    rows: Vec<RowAnalysis>,
    width: usize,
}

impl FrameAnalysis {
    fn heights(&self) -> HeightMap {
        HeightMap::from_rows(self.rows.iter().map(|r| r.height))
    }

    fn deviation(&self) -> Option<DeviationStats> {
        if self.width == 0 {
            return None;
        }
        self.rows
            .iter()
            .map(|r| (r.raw_min, r.raw_max))
            .reduce(|(a_min, a_max), (b_min, b_max)| (a_min.min(b_min), a_max.max(b_max)))
            .map(|(min, max)| DeviationStats { min, max })
    }

    fn ambiguous_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.height.is_ambiguous()).count()
    }
}

/// Computes the height of every row of `grid`.
///
/// Validates `options` first. Ambiguous rows are recorded as
/// [`AMBIGUOUS_HEIGHT`](crate::height_pipeline::AMBIGUOUS_HEIGHT) unless the
/// options ask for strict handling.
///
/// No debug image is written here, whatever `options.debug` says. Use
/// [`HeightProcessor`] for that.
pub fn compute_heights(grid: &PixelGrid, options: &ProcessorOptions) -> Result<HeightMap> {
    options.validate()?;
    let analysis = analyze_frame(grid, options, false)?;
    Ok(analysis.heights())
}

fn analyze_row(row: &[Rgba], options: &ProcessorOptions, keep_profile: bool) -> Result<RowAnalysis> {
    let mut profile = score_row(row, options.laser_color, options.metric)?;
    let raw_min = profile.iter().copied().min().unwrap_or(0);
    let raw_max = profile.iter().copied().max().unwrap_or(0);

    clip_profile(&mut profile, options.max_color_deviation);
    let troughs = find_troughs(
        &profile,
        options.min_trough_width,
        options.min_trough_height,
    )?;
    let height = row_height(&troughs, &options.calibration);

    if !keep_profile {
        profile = Vec::new();
    }

    Ok(RowAnalysis {
        height,
        raw_min,
        raw_max,
        profile,
    })
}

fn analyze_frame(
    grid: &PixelGrid,
    options: &ProcessorOptions,
    keep_profiles: bool,
) -> Result<FrameAnalysis> {
    check_trough_width(options.min_trough_width)?;

    let grid = match options.blur_kernel {
        Some(size) => {
            let _span = tracing::info_span!("blur", kernel = size).entered();
            Cow::Owned(gaussian_blur(grid, size)?)
        }
        None => Cow::Borrowed(grid),
    };

    let rows = {
        let _span = tracing::info_span!("rows", count = grid.height()).entered();
        (0..grid.height())
            .into_par_iter()
            .map(|y| {
                analyze_row(grid.row(y), options, keep_profiles).map_err(|e| match e {
                    ProcessorError::RangeError(msg) => {
                        ProcessorError::RangeError(format!("row {}: {}", y, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?
    };

    if options.ambiguous_rows == AmbiguousRowPolicy::Strict {
        let first_ambiguous = rows.iter().enumerate().find_map(|(row, r)| match r.height {
            RowHeight::Ambiguous { troughs } => Some((row, troughs)),
            RowHeight::Measured(_) => None,
        });
        if let Some((row, troughs)) = first_ambiguous {
            return Err(ProcessorError::AmbiguousRow { row, troughs });
        }
    }

    Ok(FrameAnalysis {
        rows,
        width: grid.width(),
    })
}

/// Per-frame height extraction with an optional debug image side channel
pub struct HeightProcessor<K: DebugSink = TiffDebugSink> {
    options: ProcessorOptions,
    sink: K,
}

impl HeightProcessor<TiffDebugSink> {
    pub fn new(options: ProcessorOptions) -> Result<Self> {
        Self::with_sink(options, TiffDebugSink)
    }
}

impl<K: DebugSink> HeightProcessor<K> {
    pub fn with_sink(options: ProcessorOptions, sink: K) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, sink })
    }

    #[instrument(skip(self, grid), fields(width = grid.width(), height = grid.height()))]
    pub fn process(&self, grid: &PixelGrid) -> Result<FrameReport> {
        let debug_enabled = self.options.debug.enabled;
        let analysis = analyze_frame(grid, &self.options, debug_enabled)?;

        let heights = analysis.heights();
        let deviation = analysis.deviation();
        let ambiguous_rows = analysis.ambiguous_rows();

        if let Some(stats) = deviation {
            debug!(min = stats.min, max = stats.max, "Raw color deviation range");
        }
        info!(rows = heights.len(), ambiguous_rows, "Frame processed");

        let debug_error = if debug_enabled {
            let _span = tracing::info_span!("debug_image").entered();
            let profiles = analysis.rows.into_iter().map(|r| r.profile).collect();
            let image = DebugImage::from_profiles(analysis.width, profiles);
            self.write_debug_image(&image).err()
        } else {
            None
        };

        Ok(FrameReport {
            heights,
            deviation,
            ambiguous_rows,
            debug_error,
        })
    }

    fn write_debug_image(&self, image: &DebugImage) -> Result<()> {
        let path = self.options.debug.debug_image_path().ok_or_else(|| {
            ProcessorError::SinkError("no debug image filename configured".to_string())
        })?;

        if let Err(e) = self.sink.write_debug(image, path) {
            warn!("Debug image not written: {}", e);
            return Err(match e {
                sink @ ProcessorError::SinkError(_) => sink,
                other => ProcessorError::SinkError(other.to_string()),
            });
        }
        Ok(())
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}
