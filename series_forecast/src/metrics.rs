//! Metrics for evaluating forecast performance
//!
//! The single-metric functions return NaN for empty or mismatched input so
//! they can be dropped into reports unconditionally; [`forecast_accuracy`]
//! validates instead.

use crate::error::{ForecastError, Result};
use serde::Serialize;

fn paired<'a>(forecast: &'a [f64], actual: &'a [f64]) -> Option<impl Iterator<Item = (f64, f64)> + 'a> {
    if forecast.is_empty() || forecast.len() != actual.len() {
        return None;
    }
    Some(forecast.iter().copied().zip(actual.iter().copied()))
}

/// Mean squared error
pub fn mean_squared_error(forecast: &[f64], actual: &[f64]) -> f64 {
    match paired(forecast, actual) {
        Some(pairs) => pairs.map(|(f, a)| (a - f).powi(2)).sum::<f64>() / forecast.len() as f64,
        None => f64::NAN,
    }
}

/// Root mean squared error
pub fn root_mean_squared_error(forecast: &[f64], actual: &[f64]) -> f64 {
    mean_squared_error(forecast, actual).sqrt()
}

/// Mean absolute error
pub fn mean_absolute_error(forecast: &[f64], actual: &[f64]) -> f64 {
    match paired(forecast, actual) {
        Some(pairs) => pairs.map(|(f, a)| (a - f).abs()).sum::<f64>() / forecast.len() as f64,
        None => f64::NAN,
    }
}

/// Mean absolute percentage error, in percent; zero actuals are skipped
pub fn mean_absolute_percentage_error(forecast: &[f64], actual: &[f64]) -> f64 {
    match paired(forecast, actual) {
        Some(pairs) => {
            pairs
                .filter(|(_, a)| *a != 0.0)
                .map(|(f, a)| ((a - f) / a).abs() * 100.0)
                .sum::<f64>()
                / forecast.len() as f64
        }
        None => f64::NAN,
    }
}

/// Symmetric mean absolute percentage error, in percent
pub fn symmetric_mean_absolute_percentage_error(forecast: &[f64], actual: &[f64]) -> f64 {
    match paired(forecast, actual) {
        Some(pairs) => {
            pairs
                .map(|(f, a)| {
                    let denominator = a.abs() + f.abs();
                    if denominator == 0.0 {
                        0.0
                    } else {
                        200.0 * (a - f).abs() / denominator
                    }
                })
                .sum::<f64>()
                / forecast.len() as f64
        }
        None => f64::NAN,
    }
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

/// All accuracy metrics of a forecast against the held-out values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let mse = mean_squared_error(forecast, actual);
    Ok(ForecastAccuracy {
        mae: mean_absolute_error(forecast, actual),
        mse,
        rmse: mse.sqrt(),
        mape: mean_absolute_percentage_error(forecast, actual),
        smape: symmetric_mean_absolute_percentage_error(forecast, actual),
    })
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:     {:.4}", self.mae)?;
        writeln!(f, "  MSE:     {:.4}", self.mse)?;
        writeln!(f, "  RMSE:    {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:    {:.4}%", self.mape)?;
        writeln!(f, "  SMAPE:   {:.4}%", self.smape)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FORECAST: [f64; 4] = [2.0, 4.0, 6.0, 8.0];
    const ACTUAL: [f64; 4] = [1.0, 5.0, 6.0, 10.0];

    #[test]
    fn test_error_metrics() {
        // errors -1, 1, 0, 2
        assert_relative_eq!(mean_squared_error(&FORECAST, &ACTUAL), 1.5);
        assert_relative_eq!(root_mean_squared_error(&FORECAST, &ACTUAL), 1.5f64.sqrt());
        assert_relative_eq!(mean_absolute_error(&FORECAST, &ACTUAL), 1.0);
        assert_relative_eq!(
            mean_absolute_percentage_error(&FORECAST, &ACTUAL),
            (100.0 + 20.0 + 0.0 + 20.0) / 4.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_mismatched_inputs_are_nan() {
        assert!(root_mean_squared_error(&[1.0], &[1.0, 2.0]).is_nan());
        assert!(mean_absolute_error(&[], &[]).is_nan());
        assert!(symmetric_mean_absolute_percentage_error(&[1.0], &[]).is_nan());
    }

    #[test]
    fn test_perfect_forecast() {
        let accuracy = forecast_accuracy(&ACTUAL, &ACTUAL).unwrap();
        assert_eq!(accuracy.mse, 0.0);
        assert_eq!(accuracy.rmse, 0.0);
        assert_eq!(accuracy.smape, 0.0);
    }

    #[test]
    fn test_forecast_accuracy_validates() {
        assert!(matches!(
            forecast_accuracy(&[1.0], &[]),
            Err(ForecastError::ValidationError(_))
        ));
        let report = forecast_accuracy(&FORECAST, &ACTUAL).unwrap().to_string();
        assert!(report.contains("RMSE:    1.2247"));
    }
}
