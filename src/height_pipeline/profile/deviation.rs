use crate::height_pipeline::common::error::Result;
use crate::height_pipeline::frame::types::Rgba;
use crate::height_pipeline::profile::color_metric::ColorMetric;

/// Per-column distance to the laser color for one image row, left to right.
pub type DeviationProfile = Vec<u16>;

/// Scores every pixel of `row` against `laser`, without clipping.
pub fn score_row(row: &[Rgba], laser: Rgba, metric: ColorMetric) -> Result<DeviationProfile> {
    row.iter()
        .map(|&pixel| metric.distance(pixel, laser))
        .collect()
}

/// Flattens every score above `max_color_deviation` to `u16::MAX`, so the
/// trough detector only has to tell "near" from "far".
pub fn clip_profile(profile: &mut [u16], max_color_deviation: u16) {
    for score in profile.iter_mut() {
        if *score > max_color_deviation {
            *score = u16::MAX;
        }
    }
}

pub fn build_deviation_profile(
    row: &[Rgba],
    laser: Rgba,
    metric: ColorMetric,
    max_color_deviation: u16,
) -> Result<DeviationProfile> {
    let mut profile = score_row(row, laser, metric)?;
    clip_profile(&mut profile, max_color_deviation);
    Ok(profile)
}
