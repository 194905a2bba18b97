//! Autocorrelation function and its confidence band

use crate::{ensure_len, MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Sample autocorrelation for lags `0..=max_lag`
///
/// Uses the biased estimator (every lag divided by `n`), so the sequence is
/// positive semi-definite. `max_lag` is clamped to `n - 1`.
pub fn autocorrelation(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    ensure_len(values, 2, "autocorrelation")?;

    let n = values.len();
    let max_lag = max_lag.min(n - 1);
    let mean = values.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let variance: f64 = centered.iter().map(|v| v * v).sum();
    if variance.abs() < f64::EPSILON {
        return Err(MathError::CalculationError(
            "Autocorrelation is undefined for a constant series".to_string(),
        ));
    }

    let acf = (0..=max_lag)
        .map(|lag| {
            let covariance: f64 = centered[lag..]
                .iter()
                .zip(centered.iter())
                .map(|(a, b)| a * b)
                .sum();
            covariance / variance
        })
        .collect();

    Ok(acf)
}

/// Half-width of the `1 - alpha` confidence band around each ACF value
///
/// Bartlett's formula: the variance at lag `k` grows with the squared
/// autocorrelations below it. Lag 0 has a zero-width band.
pub fn confidence_band(acf: &[f64], n: usize, alpha: f64) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Confidence band needs a non-empty sample".to_string(),
        ));
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Significance level must be between 0 and 1, got {}",
            alpha
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(format!("Normal distribution: {}", e)))?;
    let z = normal.inverse_cdf(1.0 - alpha / 2.0);

    let mut band = Vec::with_capacity(acf.len());
    let mut cumulative = 0.0;
    for lag in 0..acf.len() {
        if lag == 0 {
            band.push(0.0);
            continue;
        }
        if lag > 1 {
            cumulative += acf[lag - 1].powi(2);
        }
        let variance = (1.0 + 2.0 * cumulative) / n as f64;
        band.push(z * variance.sqrt());
    }

    Ok(band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lag_zero_is_one() {
        let acf = autocorrelation(&[1.0, 3.0, 2.0, 5.0, 4.0], 2).unwrap();
        assert_eq!(acf.len(), 3);
        assert_relative_eq!(acf[0], 1.0);
    }

    #[test]
    fn test_known_values() {
        // mean 3, centered [-2, -1, 0, 1, 2], denominator 10
        let acf = autocorrelation(&[1.0, 2.0, 3.0, 4.0, 5.0], 2).unwrap();
        assert_relative_eq!(acf[1], 0.4, epsilon = 1e-12);
        assert_relative_eq!(acf[2], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_max_lag_is_clamped() {
        let acf = autocorrelation(&[1.0, 2.0, 4.0], 100).unwrap();
        assert_eq!(acf.len(), 3);
    }

    #[test]
    fn test_constant_series_is_rejected() {
        assert!(matches!(
            autocorrelation(&[2.0, 2.0, 2.0], 1),
            Err(MathError::CalculationError(_))
        ));
    }

    #[test]
    fn test_confidence_band() {
        let acf = vec![1.0, 0.5, 0.2];
        let band = confidence_band(&acf, 100, 0.05).unwrap();

        assert_eq!(band[0], 0.0);
        assert_relative_eq!(band[1], 1.959964 * (1.0f64 / 100.0).sqrt(), epsilon = 1e-5);
        assert_relative_eq!(band[2], 1.959964 * (1.5f64 / 100.0).sqrt(), epsilon = 1e-5);
    }
}
