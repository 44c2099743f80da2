//! Processor configuration types

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::height_pipeline::common::error::{ProcessorError, Result};
use crate::height_pipeline::frame::types::Rgba;
use crate::height_pipeline::profile::ColorMetric;

/// Key in [`DebugOptions::filenames`] naming the deviation debug image.
pub const DEBUG_IMAGE_KEY: &str = "debugimage";

/// Orientation of the projected laser lines relative to the image rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDirection {
    /// Lines cross every image row; rows are scanned left to right
    #[default]
    Horizontal,
    /// Lines run along the rows. Not supported yet, rejected by validation
    Vertical,
}

impl fmt::Display for LineDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineDirection::Horizontal => f.write_str("horizontal"),
            LineDirection::Vertical => f.write_str("vertical"),
        }
    }
}

impl FromStr for LineDirection {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "horizontal" => Ok(LineDirection::Horizontal),
            "vertical" => Ok(LineDirection::Vertical),
            other => Err(ProcessorError::ConfigurationError(format!(
                "line direction \"{}\" is invalid. Valid values are: horizontal",
                other
            ))),
        }
    }
}

/// What to do with a row that shows neither one nor two laser lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguousRowPolicy {
    /// Record [`AMBIGUOUS_HEIGHT`](crate::height_pipeline::AMBIGUOUS_HEIGHT) and keep going
    #[default]
    Sentinel,
    /// Abort the whole frame on the first ambiguous row
    Strict,
}

/// Numeric outputs of the camera/laser calibration
///
/// Only `pixel_per_mm` feeds the height formula. The other fields describe the
/// optical setup and are kept for a calibration curve that interpolates
/// between the 0 mm and 10 mm measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationResults {
    /// Distance of the laser lines on the reference plate (should be 0)
    pub distance_at_0: f64,
    /// Distance of the laser lines 10 mm above the plate
    pub distance_at_10: f64,
    /// Thickness of one laser line in pixels
    pub width_of_laser: f64,
    /// How many pixels represent one millimeter
    pub pixel_per_mm: f64,
}

impl Default for CalibrationResults {
    fn default() -> Self {
        Self {
            distance_at_0: 0.0,
            distance_at_10: 0.0,
            width_of_laser: 0.0,
            pixel_per_mm: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    pub enabled: bool,
    pub filenames: HashMap<String, PathBuf>,
}

impl DebugOptions {
    pub fn debug_image_path(&self) -> Option<&Path> {
        self.filenames.get(DEBUG_IMAGE_KEY).map(PathBuf::as_path)
    }
}

/// Configuration for per-row height extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorOptions {
    pub line_direction: LineDirection,
    /// Reference color of the laser, written as `[r, g, b, a]` with 8-bit channels
    #[serde(with = "rgba8")]
    pub laser_color: Rgba,
    /// Scores above this are flattened to `u16::MAX`
    pub max_color_deviation: u16,
    /// Window size of the trough detector; must be odd
    pub min_trough_width: usize,
    /// How much lower than both window edges a trough has to be. Should exceed
    /// the normal color variance of the frame
    pub min_trough_height: u16,
    pub metric: ColorMetric,
    pub ambiguous_rows: AmbiguousRowPolicy,
    /// Side length of a Gaussian blur applied before scoring
    pub blur_kernel: Option<usize>,
    pub calibration: CalibrationResults,
    pub debug: DebugOptions,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            line_direction: LineDirection::Horizontal,
            laser_color: Rgba::RED,
            max_color_deviation: 10000,
            min_trough_width: 15,
            min_trough_height: 1,
            metric: ColorMetric::Redmean,
            ambiguous_rows: AmbiguousRowPolicy::Sentinel,
            blur_kernel: None,
            calibration: CalibrationResults::default(),
            debug: DebugOptions::default(),
        }
    }
}

impl ProcessorOptions {
    pub fn builder() -> ProcessorOptionsBuilder {
        ProcessorOptionsBuilder::default()
    }

    /// Rejects configurations the processor cannot run with.
    ///
    /// The trough width's oddness is left to the trough detector.
    pub fn validate(&self) -> Result<()> {
        if self.line_direction != LineDirection::Horizontal {
            return Err(ProcessorError::ConfigurationError(format!(
                "line direction \"{}\" is not supported. Valid values are: horizontal",
                self.line_direction
            )));
        }

        let ppm = self.calibration.pixel_per_mm;
        if !ppm.is_finite() || ppm <= 0.0 {
            return Err(ProcessorError::ConfigurationError(format!(
                "pixel_per_mm must be a positive number, got {}",
                ppm
            )));
        }

        if let Some(size) = self.blur_kernel {
            if size == 0 || size % 2 == 0 {
                return Err(ProcessorError::ConfigurationError(format!(
                    "blur kernel size must be a positive odd number, got {}",
                    size
                )));
            }
        }

        if self.debug.enabled && self.debug.debug_image_path().is_none() {
            return Err(ProcessorError::ConfigurationError(format!(
                "debug output is enabled but no \"{}\" filename is set",
                DEBUG_IMAGE_KEY
            )));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ProcessorError::ConfigurationError(format!("invalid options: {}", e)))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProcessorError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ProcessorError::ConfigurationError(e.to_string()))
    }
}

/// Builder for ProcessorOptions
#[derive(Default)]
pub struct ProcessorOptionsBuilder {
    line_direction: Option<LineDirection>,
    laser_color: Option<Rgba>,
    max_color_deviation: Option<u16>,
    min_trough_width: Option<usize>,
    min_trough_height: Option<u16>,
    metric: Option<ColorMetric>,
    ambiguous_rows: Option<AmbiguousRowPolicy>,
    blur_kernel: Option<Option<usize>>,
    calibration: Option<CalibrationResults>,
    debug: Option<DebugOptions>,
}

impl ProcessorOptionsBuilder {
    pub fn line_direction(mut self, direction: LineDirection) -> Self {
        self.line_direction = Some(direction);
        self
    }

    pub fn laser_color(mut self, color: Rgba) -> Self {
        self.laser_color = Some(color);
        self
    }

    pub fn max_color_deviation(mut self, deviation: u16) -> Self {
        self.max_color_deviation = Some(deviation);
        self
    }

    pub fn min_trough_width(mut self, width: usize) -> Self {
        self.min_trough_width = Some(width);
        self
    }

    pub fn min_trough_height(mut self, height: u16) -> Self {
        self.min_trough_height = Some(height);
        self
    }

    pub fn metric(mut self, metric: ColorMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn ambiguous_rows(mut self, policy: AmbiguousRowPolicy) -> Self {
        self.ambiguous_rows = Some(policy);
        self
    }

    pub fn blur_kernel(mut self, size: Option<usize>) -> Self {
        self.blur_kernel = Some(size);
        self
    }

    pub fn calibration(mut self, calibration: CalibrationResults) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn debug_image<P: Into<PathBuf>>(mut self, path: P) -> Self {
        let mut debug = self.debug.take().unwrap_or_default();
        debug.enabled = true;
        debug.filenames.insert(DEBUG_IMAGE_KEY.to_string(), path.into());
        self.debug = Some(debug);
        self
    }

    pub fn build(self) -> ProcessorOptions {
        let default = ProcessorOptions::default();
        ProcessorOptions {
            line_direction: self.line_direction.unwrap_or(default.line_direction),
            laser_color: self.laser_color.unwrap_or(default.laser_color),
            max_color_deviation: self.max_color_deviation.unwrap_or(default.max_color_deviation),
            min_trough_width: self.min_trough_width.unwrap_or(default.min_trough_width),
            min_trough_height: self.min_trough_height.unwrap_or(default.min_trough_height),
            metric: self.metric.unwrap_or(default.metric),
            ambiguous_rows: self.ambiguous_rows.unwrap_or(default.ambiguous_rows),
            blur_kernel: self.blur_kernel.unwrap_or(default.blur_kernel),
            calibration: self.calibration.unwrap_or(default.calibration),
            debug: self.debug.unwrap_or(default.debug),
        }
    }
}

mod rgba8 {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::height_pipeline::frame::types::Rgba;

    pub fn serialize<S: Serializer>(color: &Rgba, serializer: S) -> Result<S::Ok, S::Error> {
        color.to_rgba8().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgba, D::Error> {
        let [r, g, b, a] = <[u8; 4]>::deserialize(deserializer)?;
        Ok(Rgba::from_rgba8(r, g, b, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = ProcessorOptions::default();
        assert_eq!(options.line_direction, LineDirection::Horizontal);
        assert_eq!(options.laser_color, Rgba::RED);
        assert_eq!(options.max_color_deviation, 10000);
        assert_eq!(options.min_trough_width, 15);
        assert_eq!(options.min_trough_height, 1);
        assert_eq!(options.metric, ColorMetric::Redmean);
        assert_eq!(options.ambiguous_rows, AmbiguousRowPolicy::Sentinel);
        assert!(!options.debug.enabled);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_options_builder() {
        let options = ProcessorOptions::builder()
            .min_trough_width(3)
            .min_trough_height(25)
            .metric(ColorMetric::Euclidean)
            .ambiguous_rows(AmbiguousRowPolicy::Strict)
            .debug_image("/tmp/debug.tiff")
            .build();

        assert_eq!(options.min_trough_width, 3);
        assert_eq!(options.min_trough_height, 25);
        assert_eq!(options.metric, ColorMetric::Euclidean);
        assert_eq!(options.ambiguous_rows, AmbiguousRowPolicy::Strict);
        assert!(options.debug.enabled);
        assert_eq!(
            options.debug.debug_image_path(),
            Some(Path::new("/tmp/debug.tiff"))
        );
        assert_eq!(options.max_color_deviation, 10000);
    }

    #[test]
    fn vertical_lines_are_rejected() {
        let options = ProcessorOptions::builder()
            .line_direction(LineDirection::Vertical)
            .build();
        assert!(matches!(
            options.validate(),
            Err(ProcessorError::ConfigurationError(_))
        ));
    }

    #[test]
    fn unknown_direction_string_is_rejected() {
        assert!(matches!(
            "diagonal".parse::<LineDirection>(),
            Err(ProcessorError::ConfigurationError(_))
        ));
        assert_eq!(
            "horizontal".parse::<LineDirection>().unwrap(),
            LineDirection::Horizontal
        );
        assert!(ProcessorOptions::from_json(r#"{"line_direction": "diagonal"}"#).is_err());
    }

    #[test]
    fn non_positive_pixel_per_mm_is_rejected() {
        for ppm in [0.0, -2.0, f64::NAN] {
            let options = ProcessorOptions::builder()
                .calibration(CalibrationResults {
                    pixel_per_mm: ppm,
                    ..CalibrationResults::default()
                })
                .build();
            assert!(matches!(
                options.validate(),
                Err(ProcessorError::ConfigurationError(_))
            ));
        }
    }

    #[test]
    fn even_blur_kernel_is_rejected() {
        let options = ProcessorOptions::builder().blur_kernel(Some(4)).build();
        assert!(options.validate().is_err());
        let options = ProcessorOptions::builder().blur_kernel(Some(5)).build();
        assert!(options.validate().is_ok());
    }

    #[test]
    fn even_trough_width_passes_validation() {
        // the trough detector rejects it on first use
        let options = ProcessorOptions::builder().min_trough_width(4).build();
        assert!(options.validate().is_ok());
    }

    #[test]
    fn debug_without_filename_is_rejected() {
        let mut options = ProcessorOptions::default();
        options.debug.enabled = true;
        assert!(options.validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let options = ProcessorOptions::from_json(
            r#"{
                "laser_color": [0, 255, 0, 255],
                "min_trough_width": 5,
                "metric": "euclidean",
                "calibration": { "pixel_per_mm": 12.5, "distance_at_10": 40.0 },
                "debug": { "enabled": true, "filenames": { "debugimage": "out.tiff" } }
            }"#,
        )
        .unwrap();

        assert_eq!(options.laser_color, Rgba::new(0, u16::MAX, 0, u16::MAX));
        assert_eq!(options.min_trough_width, 5);
        assert_eq!(options.metric, ColorMetric::Euclidean);
        assert_eq!(options.calibration.pixel_per_mm, 12.5);
        assert_eq!(options.calibration.distance_at_10, 40.0);
        assert_eq!(options.max_color_deviation, 10000);
        assert_eq!(options.debug.debug_image_path(), Some(Path::new("out.tiff")));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn json_round_trips() {
        let options = ProcessorOptions::builder().min_trough_height(7).build();
        let parsed = ProcessorOptions::from_json(&options.to_json().unwrap()).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn options_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"max_color_deviation": 2000}"#).unwrap();

        let options = ProcessorOptions::from_json_file(&path).unwrap();
        assert_eq!(options.max_color_deviation, 2000);

        let missing = ProcessorOptions::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ProcessorError::ConfigurationError(_))));
    }
}
