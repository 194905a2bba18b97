//! Forecasting models for time series data

use crate::error::{ForecastError, Result};
use serde::Serialize;
use std::fmt::Debug;

pub mod ar;
pub mod arima;

pub use ar::{AutoRegressive, InformationCriterion, TrainedAutoRegressive};
pub use arima::{Arima, TrainedArima};

/// Forecast result containing predicted values
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self { values, horizons })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Consume the result, keeping only the values
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Information criteria of a fitted model; lower is better
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InformationCriteria {
    pub aic: f64,
    pub bic: f64,
    pub hqic: f64,
}

impl InformationCriteria {
    /// Value of one criterion
    pub fn get(&self, criterion: InformationCriterion) -> f64 {
        match criterion {
            InformationCriterion::Aic => self.aic,
            InformationCriterion::Bic => self.bic,
            InformationCriterion::Hqic => self.hqic,
        }
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for the periods right after the training data
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// Out-of-sample prediction for indices `start..=end`
    ///
    /// Indices count from the first training observation, so `start` must
    /// equal the number of observations the model was trained on.
    fn predict(&self, start: usize, end: usize) -> Result<ForecastResult> {
        if start != self.total_observations() || end < start {
            return Err(ForecastError::ValidationError(format!(
                "Prediction range {}..={} must start right after the {} training observations",
                start,
                end,
                self.total_observations()
            )));
        }
        self.forecast(end - start + 1)
    }

    /// Number of observations the model was trained on
    fn total_observations(&self) -> usize;

    /// Goodness of fit on the training data
    fn information_criteria(&self) -> InformationCriteria;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a series of observations
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on the given observations
    fn train(&self, data: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_result_length_must_match() {
        assert!(ForecastResult::new(vec![1.0, 2.0], 2).is_ok());
        assert!(matches!(
            ForecastResult::new(vec![1.0], 2),
            Err(ForecastError::ValidationError(_))
        ));
    }

    #[test]
    fn test_information_criteria_lookup() {
        let criteria = InformationCriteria {
            aic: 1.0,
            bic: 2.0,
            hqic: 3.0,
        };
        assert_eq!(criteria.get(InformationCriterion::Aic), 1.0);
        assert_eq!(criteria.get(InformationCriterion::Bic), 2.0);
        assert_eq!(criteria.get(InformationCriterion::Hqic), 3.0);
    }
}
