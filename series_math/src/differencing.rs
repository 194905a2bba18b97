//! Differencing and its inverse

use crate::{MathError, Result};

/// Lag-`periods` difference: `x[t] - x[t - periods]`
///
/// The first `periods` positions are undefined and are not returned, so the
/// output is `periods` elements shorter than the input.
pub fn difference(values: &[f64], periods: usize) -> Result<Vec<f64>> {
    if periods == 0 {
        return Err(MathError::InvalidInput(
            "Differencing period must be greater than zero".to_string(),
        ));
    }
    if values.len() <= periods {
        return Ok(Vec::new());
    }

    Ok(values[periods..]
        .iter()
        .zip(values.iter())
        .map(|(current, previous)| current - previous)
        .collect())
}

/// Apply first differences `order` times
pub fn difference_order(values: &[f64], order: usize) -> Vec<f64> {
    let mut result = values.to_vec();
    for _ in 0..order {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `order` first differences of a forecast that continues `history`
///
/// `forecast` is on the differenced scale and starts right after the last
/// element of `history`.
pub fn integrate(forecast: &[f64], history: &[f64], order: usize) -> Result<Vec<f64>> {
    if order == 0 {
        return Ok(forecast.to_vec());
    }
    if history.len() < order {
        return Err(MathError::InsufficientData(format!(
            "Integrating {} differences needs at least {} history values, got {}",
            order,
            order,
            history.len()
        )));
    }

    let mut result = forecast.to_vec();
    for level in (0..order).rev() {
        let anchor = difference_order(history, level)
            .last()
            .copied()
            .ok_or_else(|| {
                MathError::InsufficientData("History too short to integrate".to_string())
            })?;

        let mut running = anchor;
        for value in result.iter_mut() {
            running += *value;
            *value = running;
        }
    }

    Ok(result)
}
