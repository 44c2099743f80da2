//! Row profiling module
//!
//! Turns an image row into a deviation profile against the laser color and finds
//! the troughs the laser lines leave in it.

mod color_metric;
mod deviation;
mod trough;
mod blur;

pub use color_metric::{ColorMetric, euclidean_distance, redmean_distance};
pub use deviation::{DeviationProfile, build_deviation_profile, clip_profile, score_row};
pub use trough::{check_trough_width, find_troughs};
pub use blur::{gaussian_blur, gaussian_kernel};
