//! Autoregressive model with a constant, fitted by ordinary least squares

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, InformationCriteria, TrainedForecastModel};
use series_math::linalg::least_squares;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Criterion used to pick the lag order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InformationCriterion {
    Aic,
    Bic,
    Hqic,
}

impl InformationCriterion {
    pub const ALL: [InformationCriterion; 3] = [Self::Aic, Self::Bic, Self::Hqic];

    /// Short lowercase code, as accepted by [`FromStr`]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Aic => "aic",
            Self::Bic => "bic",
            Self::Hqic => "hqic",
        }
    }

    /// Human readable name shown in reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Aic => "Akaike Information Criterion",
            Self::Bic => "Bayes Information Criterion",
            Self::Hqic => "Hannan-Quinn Information Criterion",
        }
    }
}

impl FromStr for InformationCriterion {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aic" => Ok(Self::Aic),
            "bic" => Ok(Self::Bic),
            "hqic" => Ok(Self::Hqic),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown information criterion '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for InformationCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Autoregressive model AR(k) with an intercept
///
/// Without a criterion the lag is the rule-of-thumb maximum
/// `round(12 * (n / 100)^(1/4))`. With one, every lag up to that maximum is
/// fitted on a common sample and the lowest criterion wins.
#[derive(Debug, Clone)]
pub struct AutoRegressive {
    /// Name of the model
    name: String,
    /// Lag selection criterion
    ic: Option<InformationCriterion>,
}

/// Fitted AR model
#[derive(Debug, Clone)]
pub struct TrainedAutoRegressive {
    name: String,
    lag: usize,
    intercept: f64,
    /// Coefficients for lags 1..=lag
    coefficients: Vec<f64>,
    sigma2: f64,
    criteria: InformationCriteria,
    total_observations: usize,
    /// Last `lag` training values, oldest first
    tail: Vec<f64>,
}

/// Result of one least squares fit
struct LagFit {
    params: Vec<f64>,
    ssr: f64,
    nobs: usize,
}

impl AutoRegressive {
    /// Create a new AR model
    pub fn new(ic: Option<InformationCriterion>) -> Self {
        let name = match ic {
            Some(ic) => format!("AR({})", ic),
            None => "AR".to_string(),
        };
        Self { name, ic }
    }

    /// Criterion used for lag selection, if any
    pub fn criterion(&self) -> Option<InformationCriterion> {
        self.ic
    }

    /// Largest lag considered for `nobs` observations
    pub fn max_lag(nobs: usize) -> usize {
        let rule = (12.0 * (nobs as f64 / 100.0).powf(0.25)).round() as usize;
        // leave at least lag + 2 rows for lag + 1 parameters
        let mut lag = rule.max(1);
        while lag > 0 && nobs < 2 * lag + 2 {
            lag -= 1;
        }
        lag
    }

    fn select_lag(&self, data: &[f64], max_lag: usize) -> Result<usize> {
        let Some(ic) = self.ic else {
            return Ok(max_lag);
        };

        let mut best: Option<(usize, f64)> = None;
        for lag in 1..=max_lag {
            let fit = fit_lag(data, lag, max_lag)?;
            let value = criteria(fit.ssr, fit.nobs, lag).get(ic);
            debug!(lag, criterion = %ic, value, "ar lag candidate");
            if best.map_or(true, |(_, current)| value < current) {
                best = Some((lag, value));
            }
        }

        best.map(|(lag, _)| lag).ok_or_else(|| {
            ForecastError::ForecastingError("No lag order could be evaluated".to_string())
        })
    }
}

impl ForecastModel for AutoRegressive {
    type Trained = TrainedAutoRegressive;

    fn train(&self, data: &[f64]) -> Result<TrainedAutoRegressive> {
        let max_lag = Self::max_lag(data.len());
        if max_lag == 0 {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for an autoregression. Need at least 4 observations, got {}.",
                data.len()
            )));
        }

        let lag = self.select_lag(data, max_lag)?;
        let fit = fit_lag(data, lag, lag)?;
        let sigma2 = fit.ssr / fit.nobs as f64;

        debug!(lag, max_lag, sigma2, "ar model fitted");

        Ok(TrainedAutoRegressive {
            name: format!("AR({})", lag),
            lag,
            intercept: fit.params[0],
            coefficients: fit.params[1..].to_vec(),
            sigma2,
            criteria: criteria(fit.ssr, fit.nobs, lag),
            total_observations: data.len(),
            tail: data[data.len() - lag..].to_vec(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedAutoRegressive {
    /// Selected lag order
    pub fn lag(&self) -> usize {
        self.lag
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficients for lags 1..=lag
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Residual variance (SSR / nobs)
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }
}

impl TrainedForecastModel for TrainedAutoRegressive {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let mut history = self.tail.clone();
        let mut forecasts = Vec::with_capacity(horizons);

        for _ in 0..horizons {
            let forecast = self.intercept
                + self
                    .coefficients
                    .iter()
                    .zip(history.iter().rev())
                    .map(|(c, y)| c * y)
                    .sum::<f64>();
            history.push(forecast);
            forecasts.push(forecast);
        }

        ForecastResult::new(forecasts, horizons)
    }

    fn total_observations(&self) -> usize {
        self.total_observations
    }

    fn information_criteria(&self) -> InformationCriteria {
        self.criteria
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Regress `y[t]` on a constant and `y[t-1..=t-lag]` for `t >= start`
fn fit_lag(data: &[f64], lag: usize, start: usize) -> Result<LagFit> {
    let (design, target): (Vec<Vec<f64>>, Vec<f64>) = (start..data.len())
        .map(|t| {
            let mut row = Vec::with_capacity(lag + 1);
            row.push(1.0);
            row.extend((1..=lag).map(|i| data[t - i]));
            (row, data[t])
        })
        .unzip();

    let params = least_squares(&design, &target)?;
    let ssr = design
        .iter()
        .zip(target.iter())
        .map(|(row, y)| {
            let fitted: f64 = row.iter().zip(params.iter()).map(|(x, b)| x * b).sum();
            (y - fitted).powi(2)
        })
        .sum();

    Ok(LagFit {
        params,
        ssr,
        nobs: target.len(),
    })
}

/// Criteria on the residual variance scale, with `lag + 1` regressors
fn criteria(ssr: f64, nobs: usize, lag: usize) -> InformationCriteria {
    let n = nobs as f64;
    let k = (lag + 1) as f64;
    let log_sigma2 = (ssr / n).ln();

    InformationCriteria {
        aic: log_sigma2 + 2.0 * (1.0 + k) / n,
        bic: log_sigma2 + (1.0 + k) * n.ln() / n,
        hqic: log_sigma2 + 2.0 * n.ln().ln() * (1.0 + k) / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};
    use rstest::rstest;

    #[rstest]
    #[case("aic", InformationCriterion::Aic)]
    #[case("BIC", InformationCriterion::Bic)]
    #[case(" hqic ", InformationCriterion::Hqic)]
    fn test_parse_criterion(#[case] text: &str, #[case] expected: InformationCriterion) {
        assert_eq!(text.parse::<InformationCriterion>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_criterion_is_invalid_parameter() {
        let err = "mdl".parse::<InformationCriterion>().unwrap_err();
        assert!(err.is_client_error());
    }

    #[rstest]
    #[case(100, 12)]
    #[case(400, 17)]
    #[case(16, 7)]
    #[case(10, 4)]
    #[case(4, 1)]
    #[case(3, 0)]
    fn test_max_lag(#[case] nobs: usize, #[case] expected: usize) {
        assert_eq!(AutoRegressive::max_lag(nobs), expected);
    }

    #[test]
    fn test_simulated_ar1_is_recovered() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut data = vec![2.0];
        for t in 1..300 {
            data.push(1.0 + 0.5 * data[t - 1] + noise.sample(&mut rng));
        }

        let model = AutoRegressive::new(Some(InformationCriterion::Bic))
            .train(&data)
            .unwrap();

        assert_abs_diff_eq!(model.coefficients()[0], 0.5, epsilon = 0.15);
        let long_run_mean = model.intercept() / (1.0 - model.coefficients().iter().sum::<f64>());
        assert_abs_diff_eq!(long_run_mean, 2.0, epsilon = 0.5);
        assert_eq!(model.total_observations(), 300);
        assert_eq!(model.forecast(3).unwrap().values().len(), 3);
    }

    #[test]
    fn test_predict_matches_forecast() {
        let mut rng = StdRng::seed_from_u64(11);
        let noise = Normal::new(10.0, 2.0).unwrap();
        let data: Vec<f64> = (0..40).map(|_| noise.sample(&mut rng)).collect();
        let model = AutoRegressive::new(None).train(&data).unwrap();

        let predicted = model.predict(40, 44).unwrap();
        let forecast = model.forecast(5).unwrap();
        assert_eq!(predicted.values(), forecast.values());

        assert!(model.predict(30, 44).is_err());
    }

    #[test]
    fn test_forecast_recursion() {
        let model = TrainedAutoRegressive {
            name: "AR(2)".to_string(),
            lag: 2,
            intercept: 1.0,
            coefficients: vec![0.5, 0.25],
            sigma2: 1.0,
            criteria: InformationCriteria {
                aic: 0.0,
                bic: 0.0,
                hqic: 0.0,
            },
            total_observations: 10,
            tail: vec![4.0, 8.0],
        };

        let forecast = model.forecast(2).unwrap();
        // 1 + 0.5 * 8 + 0.25 * 4 = 6, then 1 + 0.5 * 6 + 0.25 * 8 = 6
        assert_abs_diff_eq!(forecast.values()[0], 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(forecast.values()[1], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_too_short_series() {
        let err = AutoRegressive::new(None).train(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ForecastError::ValidationError(_)));
    }
}
