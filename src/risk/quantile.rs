//! Sample quantiles with linear interpolation between closest ranks

use crate::errors::{OutbreakError, Result};

/// Quantile `q` of `values`, interpolating linearly between the two
/// nearest order statistics at position `(n - 1) * q`.
///
/// Returns `Ok(None)` for an empty slice. Non-finite values are ignored.
pub fn quantile(values: &[f64], q: f64) -> Result<Option<f64>> {
    if !(0.0..=1.0).contains(&q) {
        return Err(OutbreakError::InvalidQuantile(q));
    }

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Ok(None);
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    Ok(Some(quantile_sorted(&sorted, q)))
}

/// Same as [`quantile`] for an already sorted, non-empty slice
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Median, or `None` for no values
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5).ok().flatten()
}
