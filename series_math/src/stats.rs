//! Descriptive statistics
//!
//! Contains the summary measures reported for an uploaded series:
//! - Minimum / maximum
//! - Mean and sample standard deviation
//! - Median and arbitrary quantiles
//! - Interquartile range

use crate::{ensure_len, MathError, Result};
use serde::Serialize;
use statrs::statistics::Statistics;

/// How a quantile is read off between two neighbouring order statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interpolation {
    /// Linear interpolation between the closest ranks
    Linear,
    /// Average of the two closest ranks
    Midpoint,
}

/// Summary of a sample, in the order the analysis page lists it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    /// `Q3 - Q1` with both quartiles read by the midpoint rule
    pub interquartile_range: f64,
}

/// Smallest value of the sample
pub fn min(values: &[f64]) -> Result<f64> {
    ensure_len(values, 1, "minimum")?;
    Ok(Statistics::min(values.iter()))
}

/// Largest value of the sample
pub fn max(values: &[f64]) -> Result<f64> {
    ensure_len(values, 1, "maximum")?;
    Ok(Statistics::max(values.iter()))
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    ensure_len(values, 1, "mean")?;
    Ok(Statistics::mean(values.iter()))
}

/// Sample standard deviation (n - 1 denominator)
///
/// A single observation has no spread estimate and yields NaN, the same
/// answer a dataframe library gives.
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    ensure_len(values, 1, "standard deviation")?;
    if values.len() == 1 {
        return Ok(f64::NAN);
    }
    Ok(Statistics::std_dev(values.iter()))
}

/// Median (the 0.5 quantile)
pub fn median(values: &[f64]) -> Result<f64> {
    quantile(values, 0.5)
}

/// Quantile `q` with linear interpolation between closest ranks
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    quantile_with(values, q, Interpolation::Linear)
}

fn quantile_with(values: &[f64], q: f64, interpolation: Interpolation) -> Result<f64> {
    ensure_len(values, 1, "quantile")?;
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be between 0 and 1, got {}",
            q
        )));
    }

    let sorted = sorted_copy(values);
    Ok(quantile_sorted(&sorted, q, interpolation))
}

/// Interquartile range with midpoint interpolation of both quartiles
pub fn interquartile_range_midpoint(values: &[f64]) -> Result<f64> {
    ensure_len(values, 1, "interquartile range")?;
    Ok(midpoint_iqr(&sorted_copy(values)))
}

/// Compute every summary measure in one pass over a sorted copy
pub fn describe(values: &[f64]) -> Result<Summary> {
    ensure_len(values, 1, "summary")?;
    let sorted = sorted_copy(values);

    Ok(Summary {
        count: values.len(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: mean(values)?,
        std_dev: sample_std_dev(values)?,
        median: quantile_sorted(&sorted, 0.5, Interpolation::Linear),
        q1: quantile_sorted(&sorted, 0.25, Interpolation::Linear),
        q3: quantile_sorted(&sorted, 0.75, Interpolation::Linear),
        interquartile_range: midpoint_iqr(&sorted),
    })
}

fn midpoint_iqr(sorted: &[f64]) -> f64 {
    quantile_sorted(sorted, 0.75, Interpolation::Midpoint)
        - quantile_sorted(sorted, 0.25, Interpolation::Midpoint)
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn quantile_sorted(sorted: &[f64], q: f64, interpolation: Interpolation) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;

    match interpolation {
        Interpolation::Linear => {
            let fraction = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
        Interpolation::Midpoint => (sorted[lower] + sorted[upper]) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const SAMPLE: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

    #[test]
    fn test_basic_measures() {
        assert_eq!(min(&SAMPLE).unwrap(), 2.0);
        assert_eq!(max(&SAMPLE).unwrap(), 9.0);
        assert_relative_eq!(mean(&SAMPLE).unwrap(), 5.0);

        // sum of squared deviations is 32, sample variance 32 / 7
        let expected = (32.0f64 / 7.0).sqrt();
        assert_relative_eq!(sample_std_dev(&SAMPLE).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_single_value_std_dev_is_nan() {
        assert!(sample_std_dev(&[3.0]).unwrap().is_nan());
    }

    #[rstest]
    #[case(0.0, 2.0)]
    #[case(0.25, 4.0)]
    #[case(0.5, 4.5)]
    #[case(0.75, 5.5)]
    #[case(1.0, 9.0)]
    fn test_linear_quantiles(#[case] q: f64, #[case] expected: f64) {
        assert_relative_eq!(quantile(&SAMPLE, q).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_quantile_interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // position 0.1 * 3 = 0.3
        assert_relative_eq!(quantile(&values, 0.1).unwrap(), 1.3, epsilon = 1e-12);
        assert_relative_eq!(
            quantile_with(&values, 0.1, Interpolation::Midpoint).unwrap(),
            1.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_interquartile_range_midpoint() {
        // Q1 position 0.75 -> (1 + 2) / 2, Q3 position 2.25 -> (3 + 4) / 2
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(interquartile_range_midpoint(&values).unwrap(), 2.0);
    }

    #[test]
    fn test_describe() {
        let summary = describe(&SAMPLE).unwrap();
        assert_eq!(summary.count, 8);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert_relative_eq!(summary.median, 4.5);
        assert_relative_eq!(summary.q1, 4.0);
        assert_relative_eq!(summary.q3, 5.5);
        assert_relative_eq!(
            summary.interquartile_range,
            interquartile_range_midpoint(&SAMPLE).unwrap()
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(mean(&[]), Err(MathError::InsufficientData(_))));
        assert!(matches!(
            quantile(&SAMPLE, 1.5),
            Err(MathError::InvalidInput(_))
        ));
        assert!(matches!(
            quantile(&SAMPLE, f64::NAN),
            Err(MathError::InvalidInput(_))
        ));
    }
}
