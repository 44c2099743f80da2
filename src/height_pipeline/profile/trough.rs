//! Trough detection on deviation profiles
//!
//! A laser line shows up as a valley in the distance-to-laser-color profile.
//! A column is a trough when the symmetric window around it looks like this:
//!
//! ```text
//!   ideal trough        trough with noise
//!
//!  xx         xx       x         x
//!    xx     xx          xx    x x
//!      xx xx              xx x x
//!        x                  x
//! ```
//!
//! Both window edges must sit at least `min_trough_height` above the center,
//! and walking outwards from the center every value must stay between the
//! center and the edge it is walking towards. Jitter smaller than
//! `min_trough_height` therefore does not create or remove troughs.

use crate::height_pipeline::common::error::{ProcessorError, Result};

/// Returns the ascending column indices of all troughs in `profile`.
///
/// The first and last `(min_trough_width - 1) / 2` columns have no complete
/// window and are never reported.
pub fn find_troughs(
    profile: &[u16],
    min_trough_width: usize,
    min_trough_height: u16,
) -> Result<Vec<usize>> {
    check_trough_width(min_trough_width)?;
    let half = (min_trough_width - 1) / 2;

    if profile.len() < min_trough_width {
        return Ok(Vec::new());
    }

    let troughs = (half..profile.len() - half)
        .filter(|&i| is_trough(&profile[i - half..=i + half], half, min_trough_height))
        .collect();

    Ok(troughs)
}

pub fn check_trough_width(min_trough_width: usize) -> Result<()> {
    if min_trough_width % 2 != 1 {
        return Err(ProcessorError::ConfigurationError(format!(
            "the minimum trough width needs to be an odd number, got {}",
            min_trough_width
        )));
    }
    Ok(())
}

fn is_trough(window: &[u16], center: usize, min_trough_height: u16) -> bool {
    let center_value = window[center];
    let left_edge = window[0];
    let right_edge = window[window.len() - 1];

    if (left_edge as i32 - center_value as i32) < min_trough_height as i32 {
        return false;
    }
    if (right_edge as i32 - center_value as i32) < min_trough_height as i32 {
        return false;
    }

    if center == 0 {
        return true;
    }

    let within = |edge: u16| move |&v: &u16| v >= center_value && v <= edge;

    window[1..center].iter().all(within(left_edge))
        && window[center + 1..window.len() - 1]
            .iter()
            .all(within(right_edge))
}
