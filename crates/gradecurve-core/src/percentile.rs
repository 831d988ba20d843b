//! Percentile estimation over a weighted, ordered distribution.
//!
//! The estimator walks buckets in ascending value order, accumulating weight,
//! and interpolates linearly inside the bucket where the running total first
//! reaches the target.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::scale::MAX_GPA;

/// Slack allowed when comparing a cumulative sum against the target, so a
/// normalized distribution summing to 0.9999999 still reaches p = 1.0.
const CUMULATIVE_EPSILON: f64 = 1e-9;

/// Default central-mass widths for percentile bands, in percent.
pub const DEFAULT_PERCENTILE_WIDTHS: [f64; 4] = [90.0, 75.0, 50.0, 25.0];

/// A `(lower, upper)` value pair bracketing the central `width` percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    /// Central mass covered, in percent (e.g. 50 for the interquartile band).
    pub width: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Estimate the value at `target` (in `[0, 1]`) of a `(value, weight)`
/// distribution.
///
/// Inside the first non-empty bucket there is no lower neighbour to
/// interpolate from, so the bucket's own value is returned. If the
/// distribution's total weight never reaches `target`, the result is
/// [`MAX_GPA`]. Negative or NaN targets are treated as 0.
pub fn estimate_percentile(distribution: &[(f64, f64)], target: f64) -> f64 {
    let target = if target.is_nan() { 0.0 } else { target.max(0.0) };

    let mut buckets: Vec<(f64, f64)> = distribution
        .iter()
        .copied()
        .filter(|(_, weight)| *weight > 0.0)
        .collect();
    buckets.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut cumulative = 0.0;
    let mut previous: Option<f64> = None;

    for (value, weight) in buckets {
        cumulative += weight;
        if cumulative + CUMULATIVE_EPSILON >= target {
            let prev_value = previous.unwrap_or(value);
            let fraction = (1.0 - (cumulative - target) / weight).clamp(0.0, 1.0);
            return prev_value + fraction * (value - prev_value);
        }
        previous = Some(value);
    }

    MAX_GPA
}

/// Percentile targets `(lower, upper)` for a band of the given width.
pub fn band_targets(width: f64) -> (f64, f64) {
    ((100.0 - width) / 200.0, (100.0 + width) / 200.0)
}

pub(crate) fn validate_width(width: f64) -> Result<(), EngineError> {
    if width.is_finite() && width > 0.0 && width <= 100.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidPercentileWidth(width))
    }
}

/// Compute one band per configured width, in the order given.
pub fn percentile_bands(
    distribution: &[(f64, f64)],
    widths: &[f64],
) -> Result<Vec<PercentileBand>, EngineError> {
    widths
        .iter()
        .map(|&width| {
            validate_width(width)?;
            let (lo, hi) = band_targets(width);
            Ok(PercentileBand {
                width,
                lower: estimate_percentile(distribution, lo),
                upper: estimate_percentile(distribution, hi),
            })
        })
        .collect()
}
