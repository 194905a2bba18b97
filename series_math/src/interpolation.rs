//! Gap filling for series with missing observations

use crate::{MathError, Result};

/// Fill `None` entries by linear interpolation over position
///
/// Interior gaps are interpolated between their nearest observed
/// neighbours. A leading gap takes the first observed value and a trailing
/// gap carries the last observed value forward.
pub fn linear_fill(values: &[Option<f64>]) -> Result<Vec<f64>> {
    let observed: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .collect();

    let (first_idx, first_value) = *observed.first().ok_or_else(|| {
        MathError::InsufficientData("Cannot interpolate a series with no observed values".to_string())
    })?;
    let (last_idx, last_value) = observed[observed.len() - 1];

    let mut filled = vec![0.0; values.len()];
    for slot in filled.iter_mut().take(first_idx + 1) {
        *slot = first_value;
    }
    for slot in filled.iter_mut().skip(last_idx) {
        *slot = last_value;
    }

    for pair in observed.windows(2) {
        let (left_idx, left) = pair[0];
        let (right_idx, right) = pair[1];
        let span = (right_idx - left_idx) as f64;
        for (offset, slot) in filled[left_idx..=right_idx].iter_mut().enumerate() {
            *slot = left + (right - left) * offset as f64 / span;
        }
    }

    Ok(filled)
}

/// Round to a fixed number of decimal places, half away from zero
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
