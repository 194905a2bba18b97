//! ARIMA models for time series forecasting
//!
//! The series is differenced `d` times and an ARMA(p, q) with intercept is
//! fitted to the result by conditional sum of squares. Forecasts are
//! integrated back to the original scale.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, InformationCriteria, TrainedForecastModel};
use series_math::differencing::{difference_order, integrate};
use series_math::linalg::least_squares;
use series_math::optimize::{nelder_mead, NelderMeadConfig};
use std::f64::consts::PI;
use tracing::debug;

/// AR and MA coefficients stay inside this box
const COEFFICIENT_BOUND: f64 = 0.99;

/// Residual variance at or below this share of the data's mean square is an exact fit
const EXACT_FIT_TOLERANCE: f64 = 1e-12;

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct Arima {
    /// Name of the model
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArima {
    name: String,
    p: usize,
    d: usize,
    q: usize,
    intercept: f64,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    criteria: InformationCriteria,
    /// Training data on the original scale
    historical_data: Vec<f64>,
    /// Training data after differencing
    differenced: Vec<f64>,
    /// In-sample one step errors on the differenced scale
    residuals: Vec<f64>,
}

impl Arima {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            name: format!("ARIMA({},{},{})", p, d, q),
            p,
            d,
            q,
        }
    }

    /// Model order as `(p, d, q)`
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    /// Fewest observations that leave two residuals after differencing
    ///
    /// Fails with `InvalidParameter` when the order is too large to count.
    pub fn min_observations(&self) -> Result<usize> {
        self.p
            .max(self.q)
            .checked_add(self.d)
            .and_then(|n| n.checked_add(2))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "ARIMA order {:?} is too large",
                    self.order()
                ))
            })
    }

    /// Starting point: intercept and AR terms from least squares when
    /// possible, MA terms at zero
    fn initial_params(&self, data: &[f64]) -> Vec<f64> {
        let mean = data.iter().sum::<f64>() / data.len() as f64;
        let mut params = vec![0.0; 1 + self.p + self.q];
        params[0] = mean;

        if self.p > 0 && data.len() >= 2 * self.p + 2 {
            let (design, target): (Vec<Vec<f64>>, Vec<f64>) = (self.p..data.len())
                .map(|t| {
                    let mut row = vec![1.0];
                    row.extend((1..=self.p).map(|i| data[t - i]));
                    (row, data[t])
                })
                .unzip();
            if let Ok(fit) = least_squares(&design, &target) {
                params[0] = fit[0];
                for (slot, value) in params[1..=self.p].iter_mut().zip(&fit[1..]) {
                    *slot = value.clamp(-COEFFICIENT_BOUND, COEFFICIENT_BOUND);
                }
            }
        }

        params
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(
            std::iter::repeat((-COEFFICIENT_BOUND, COEFFICIENT_BOUND)).take(self.p + self.q),
        );
        bounds
    }
}

impl ForecastModel for Arima {
    type Trained = TrainedArima;

    fn train(&self, data: &[f64]) -> Result<TrainedArima> {
        let min_observations = self.min_observations()?;
        if data.len() < min_observations {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for ARIMA({},{},{}). Need at least {} observations.",
                self.p, self.d, self.q, min_observations
            )));
        }

        let differenced = difference_order(data, self.d);
        let (p, q) = (self.p, self.q);

        let config = NelderMeadConfig {
            max_iter: 500 * (1 + p + q),
            ..NelderMeadConfig::default()
        };
        let initial = self.initial_params(&differenced);
        let bounds = self.bounds();
        let minimum = nelder_mead(
            |params| {
                css_residuals(&differenced, params, p, q)
                    .iter()
                    .map(|e| e * e)
                    .sum::<f64>()
            },
            &initial,
            Some(&bounds),
            &config,
        )?;

        if !minimum.value.is_finite() {
            return Err(ForecastError::ForecastingError(format!(
                "{} did not produce a finite sum of squares",
                self.name
            )));
        }

        let params = minimum.point;
        let residuals = css_residuals(&differenced, &params, p, q);
        let nobs = residuals.len() as f64;
        let sigma2 = minimum.value / nobs;
        let mean_square =
            differenced.iter().map(|v| v * v).sum::<f64>() / differenced.len() as f64;
        if !sigma2.is_finite() || sigma2 <= EXACT_FIT_TOLERANCE * mean_square {
            return Err(ForecastError::ForecastingError(format!(
                "{} fits the data exactly, residual variance {}",
                self.name, sigma2
            )));
        }
        let log_likelihood = -0.5 * nobs * ((2.0 * PI * sigma2).ln() + 1.0);

        // intercept, p + q coefficients and the innovation variance
        let k = (p + q + 2) as f64;
        let criteria = InformationCriteria {
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * nobs.ln(),
            hqic: -2.0 * log_likelihood + 2.0 * k * nobs.ln().ln(),
        };

        debug!(
            model = %self.name,
            iterations = minimum.iterations,
            converged = minimum.converged,
            sigma2,
            "arima model fitted"
        );

        Ok(TrainedArima {
            name: self.name.clone(),
            p,
            d: self.d,
            q,
            intercept: params[0],
            ar_coefficients: params[1..=p].to_vec(),
            ma_coefficients: params[p + 1..].to_vec(),
            sigma2,
            log_likelihood,
            criteria,
            historical_data: data.to_vec(),
            differenced,
            residuals,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArima {
    /// Model order as `(p, d, q)`
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Conditional Gaussian log-likelihood
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// In-sample residuals on the differenced scale
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }
}

impl TrainedForecastModel for TrainedArima {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let mut values = self.differenced.clone();
        // errors aligned with `values`; unknown shocks are zero
        let mut errors = vec![0.0; values.len() - self.residuals.len()];
        errors.extend_from_slice(&self.residuals);

        let mut forecasts = Vec::with_capacity(horizons);
        for _ in 0..horizons {
            let t = values.len();
            let next = one_step(
                &values,
                &errors,
                t,
                self.intercept,
                &self.ar_coefficients,
                &self.ma_coefficients,
            );
            values.push(next);
            errors.push(0.0);
            forecasts.push(next);
        }

        let restored = integrate(&forecasts, &self.historical_data, self.d)?;
        ForecastResult::new(restored, horizons)
    }

    fn total_observations(&self) -> usize {
        self.historical_data.len()
    }

    fn information_criteria(&self) -> InformationCriteria {
        self.criteria
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Conditional one step errors for `t >= p`, earlier shocks taken as zero
fn css_residuals(data: &[f64], params: &[f64], p: usize, q: usize) -> Vec<f64> {
    let intercept = params[0];
    let ar = &params[1..=p];
    let ma = &params[p + 1..p + 1 + q];

    let mut errors = vec![0.0; data.len()];
    for t in p..data.len() {
        errors[t] = data[t] - one_step(data, &errors, t, intercept, ar, ma);
    }
    errors.split_off(p)
}

/// Prediction of position `t` from everything before it
fn one_step(values: &[f64], errors: &[f64], t: usize, intercept: f64, ar: &[f64], ma: &[f64]) -> f64 {
    let ar_part: f64 = ar
        .iter()
        .enumerate()
        .filter(|(i, _)| t > *i)
        .map(|(i, phi)| phi * values[t - 1 - i])
        .sum();
    let ma_part: f64 = ma
        .iter()
        .enumerate()
        .filter(|(j, _)| t > *j)
        .map(|(j, theta)| theta * errors[t - 1 - j])
        .sum();
    intercept + ar_part + ma_part
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn test_linear_trend_is_continued() {
        let data: Vec<f64> = (0..30)
            .map(|t| 5.0 + 2.0 * t as f64 + 0.05 * (1.3 * t as f64).sin())
            .collect();
        let model = Arima::new(0, 1, 0).train(&data).unwrap();

        assert_abs_diff_eq!(model.intercept(), 2.0, epsilon = 1e-2);
        let forecast = model.forecast(3).unwrap();
        assert_abs_diff_eq!(forecast.values()[0], 65.0, epsilon = 0.1);
        assert_abs_diff_eq!(forecast.values()[1], 67.0, epsilon = 0.1);
        assert_abs_diff_eq!(forecast.values()[2], 69.0, epsilon = 0.1);
    }

    #[test]
    fn test_exact_fit_is_rejected() {
        let constant = vec![7.0; 40];
        let linear: Vec<f64> = (0..40).map(|t| 5.0 + 2.0 * t as f64).collect();

        let cases = [
            (&constant, (0, 1, 0)),
            (&constant, (1, 1, 1)),
            (&linear, (0, 1, 0)),
        ];
        for (data, order) in cases {
            let (p, d, q) = order;
            let err = Arima::new(p, d, q).train(data).unwrap_err();
            assert!(matches!(err, ForecastError::ForecastingError(_)), "{:?}: {}", order, err);
        }
    }

    #[test]
    fn test_oversized_order_is_an_error() {
        let model = Arima::new(usize::MAX, 1, 1);
        assert!(matches!(model.min_observations(), Err(ForecastError::InvalidParameter(_))));

        let err = model.train(&[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
        assert_eq!(Arima::new(2, 1, 3).min_observations().unwrap(), 6);
    }

    #[test]
    fn test_ar_coefficient_is_estimated() {
        let mut rng = StdRng::seed_from_u64(42);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut data = vec![0.0];
        for t in 1..400 {
            data.push(3.0 + 0.6 * data[t - 1] + noise.sample(&mut rng));
        }

        let model = Arima::new(1, 0, 0).train(&data).unwrap();

        assert_abs_diff_eq!(model.ar_coefficients()[0], 0.6, epsilon = 0.1);
        assert_abs_diff_eq!(model.sigma2(), 1.0, epsilon = 0.3);
        assert_eq!(model.total_observations(), 400);
    }

    #[test]
    fn test_coefficients_stay_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut level = 10.0;
        let data: Vec<f64> = (0..120)
            .map(|_| {
                level += noise.sample(&mut rng);
                level
            })
            .collect();

        let model = Arima::new(2, 0, 1).train(&data).unwrap();
        for c in model.ar_coefficients().iter().chain(model.ma_coefficients()) {
            assert!(c.abs() <= COEFFICIENT_BOUND);
        }
    }

    #[test]
    fn test_criteria_penalise_parameters() {
        let mut rng = StdRng::seed_from_u64(5);
        let noise = Normal::new(50.0, 1.0).unwrap();
        let data: Vec<f64> = (0..100).map(|_| noise.sample(&mut rng)).collect();

        let model = Arima::new(1, 0, 1).train(&data).unwrap();
        let criteria = model.information_criteria();
        let ll = model.log_likelihood();
        let nobs = model.residuals().len() as f64;

        assert_abs_diff_eq!(criteria.aic, -2.0 * ll + 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(criteria.bic, -2.0 * ll + 4.0 * nobs.ln(), epsilon = 1e-9);
        assert_abs_diff_eq!(criteria.hqic, -2.0 * ll + 8.0 * nobs.ln().ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_insufficient_data() {
        let err = Arima::new(3, 1, 1).train(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap_err();
        assert!(matches!(err, ForecastError::ValidationError(_)));
    }

    #[test]
    fn test_css_residuals_of_pure_mean_model() {
        let data = [1.0, 2.0, 3.0];
        let residuals = css_residuals(&data, &[2.0], 0, 0);
        assert_eq!(residuals, vec![-1.0, 0.0, 1.0]);
    }
}
