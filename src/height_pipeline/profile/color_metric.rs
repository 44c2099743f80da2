//! Color distance metrics
//!
//! Both metrics answer the same question, "how far is this pixel from the laser
//! color", as a `u16` where 0 means identical. The rest of the pipeline only
//! relies on smaller meaning closer.

use serde::{Deserialize, Serialize};

use crate::height_pipeline::common::error::{ProcessorError, Result};
use crate::height_pipeline::frame::types::Rgba;

/// Largest halved Euclidean distance tolerated before it is treated as a bug.
/// Anything between `u16::MAX` and this bound is clipped.
const EUCLIDEAN_MAX: f64 = 65601.0;

/// Empirical maximum of the raw redmean formula on 8-bit channels.
const REDMEAN_MAX: f64 = 675.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMetric {
    /// Straight-line RGB distance at 16-bit precision, halved to fit a `u16`
    Euclidean,
    /// Low-cost perceptual approximation weighting channels by the mean red level
    #[default]
    Redmean,
}

impl ColorMetric {
    pub fn distance(&self, a: Rgba, b: Rgba) -> Result<u16> {
        match self {
            ColorMetric::Euclidean => euclidean_distance(a, b),
            ColorMetric::Redmean => redmean_distance(a, b),
        }
    }
}

pub fn euclidean_distance(a: Rgba, b: Rgba) -> Result<u16> {
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;
    let dist = (dr * dr + dg * dg + db * db).sqrt() / 2.0;

    if dist.is_nan() || dist < 0.0 {
        return Err(ProcessorError::RangeError(format!(
            "euclidean distance {} is below 0 for {:?} and {:?}",
            dist, a, b
        )));
    }
    if dist > EUCLIDEAN_MAX {
        return Err(ProcessorError::RangeError(format!(
            "euclidean distance {} exceeds {} for {:?} and {:?}",
            dist, EUCLIDEAN_MAX, a, b
        )));
    }

    Ok(dist.min(u16::MAX as f64) as u16)
}

pub fn redmean_distance(a: Rgba, b: Rgba) -> Result<u16> {
    let [r1, g1, b1, _] = a.to_rgba8().map(f64::from);
    let [r2, g2, b2, _] = b.to_rgba8().map(f64::from);

    let r_mean = 0.5 * (r1 + r2);
    let dr = r1 - r2;
    let dg = g1 - g2;
    let db = b1 - b2;
    let raw = ((2.0 + r_mean / 256.0) * dr * dr
        + 4.0 * dg * dg
        + (2.0 + (255.0 - r_mean) / 256.0) * db * db)
        .sqrt();

    if raw.is_nan() || raw < 0.0 {
        return Err(ProcessorError::RangeError(format!(
            "redmean distance {} is below 0 for {:?} and {:?}",
            raw, a, b
        )));
    }

    let scaled = (raw * u16::MAX as f64 / REDMEAN_MAX).round();
    Ok(scaled.min(u16::MAX as f64) as u16)
}
