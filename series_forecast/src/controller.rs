//! Request pipelines: load a file, clean it, analyse or forecast, plot
//!
//! Each operation reloads the series from disk; nothing is cached between
//! calls.

use crate::data::{DataLoader, SeriesInfo, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::metrics::root_mean_squared_error;
use crate::models::{
    Arima, AutoRegressive, ForecastModel, InformationCriteria, InformationCriterion,
    TrainedForecastModel,
};
use crate::params::ForecastParameters;
use crate::plots;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Default number of autocorrelation lags plotted during analysis
pub const DEFAULT_ACF_LAGS: usize = 100;

/// Orders tried by the ARIMA parameter search, for each of p, d and q
pub const SEARCH_ORDERS: std::ops::RangeInclusive<usize> = 0..=5;

/// Where artifacts go and how they are drawn
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// Directory plot artifacts are written to
    pub static_dir: PathBuf,
    /// Autocorrelation lags shown on the analysis page
    pub acf_lags: usize,
}

impl AnalysisContext {
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
            acf_lags: DEFAULT_ACF_LAGS,
        }
    }

    pub fn with_acf_lags(mut self, acf_lags: usize) -> Self {
        self.acf_lags = acf_lags;
        self
    }

    fn output_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.static_dir)?;
        Ok(&self.static_dir)
    }
}

/// Statistics and plots for one series
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analyse: SeriesInfo,
    pub plots: Vec<String>,
}

/// Outcome of an AR forecast
#[derive(Debug, Clone, Serialize)]
pub struct ArReport {
    pub split_ratio: f64,
    /// Display name of the lag criterion, empty when none was used
    pub ic: String,
    pub forecast_plot: String,
    pub lag: usize,
    pub tobs: usize,
    pub rmse: f64,
}

/// Outcome of an ARIMA forecast
#[derive(Debug, Clone, Serialize)]
pub struct ArimaReport {
    pub split_ratio: f64,
    pub ar: usize,
    pub i: usize,
    pub ma: usize,
    pub forecast_plot: String,
    pub tobs: usize,
    pub aic: f64,
    pub bic: f64,
    pub hqic: f64,
    pub rmse: f64,
}

/// Lowest value of one criterion and the order that reached it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestOrder {
    pub value: f64,
    pub parameters: (usize, usize, usize),
}

/// Best ARIMA order per information criterion; `None` when nothing fitted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterSearchReport {
    pub aic: Option<BestOrder>,
    pub bic: Option<BestOrder>,
    pub hqic: Option<BestOrder>,
}

impl ParameterSearchReport {
    fn slot(&mut self, criterion: InformationCriterion) -> &mut Option<BestOrder> {
        match criterion {
            InformationCriterion::Aic => &mut self.aic,
            InformationCriterion::Bic => &mut self.bic,
            InformationCriterion::Hqic => &mut self.hqic,
        }
    }

    /// Keep `order` for every criterion it improves
    pub fn offer(&mut self, order: (usize, usize, usize), criteria: &InformationCriteria) {
        for criterion in InformationCriterion::ALL {
            let value = criteria.get(criterion);
            let slot = self.slot(criterion);
            let better = match slot {
                Some(best) => value < best.value,
                None => !value.is_nan(),
            };
            if better {
                *slot = Some(BestOrder {
                    value,
                    parameters: order,
                });
            }
        }
    }
}

/// Descriptive statistics plus the standard plots
///
/// A plotting failure is logged and leaves `plots` empty; the statistics are
/// still returned.
pub fn analysis(path: &Path, ctx: &AnalysisContext) -> Result<AnalysisReport> {
    let series = DataLoader::from_csv(path)?;
    let analyse = series.info()?;

    let plots = match draw_all(&series, ctx) {
        Ok(plots) => plots,
        Err(err) => {
            error!(error = %err, series = series.name(), "visualisation failed");
            Vec::new()
        }
    };

    info!("time series '{}' analysis.", series.name());
    debug!(?analyse, "series statistics");
    Ok(AnalysisReport { analyse, plots })
}

/// Trend, autocorrelation and histogram plots of the file's series
pub fn visualisation(path: &Path, ctx: &AnalysisContext) -> Result<Vec<String>> {
    let series = DataLoader::from_csv(path)?;
    draw_all(&series, ctx)
}

fn draw_all(series: &TimeSeries, ctx: &AnalysisContext) -> Result<Vec<String>> {
    let out_dir = ctx.output_dir()?;
    let plots = vec![
        plots::draw_series(series, out_dir)?,
        plots::draw_autocorrelation(series, ctx.acf_lags, out_dir)?,
        plots::draw_histogram(series, out_dir)?,
    ];
    info!("time series '{}' plots created!", series.name());
    Ok(plots)
}

/// Partition for model fitting; both sides must be non-empty
fn split_for_forecast(series: &TimeSeries, ratio: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    let (train, test) = series.split(ratio);
    if train.is_empty() || test.is_empty() {
        return Err(ForecastError::ForecastingError(format!(
            "Split ratio {} leaves {} training and {} test observations",
            ratio,
            train.len(),
            test.len()
        )));
    }
    Ok((train, test))
}

/// Fit an AR model on the training prefix and forecast the test suffix
pub fn forecast_ar(
    path: &Path,
    params: &ForecastParameters,
    ctx: &AnalysisContext,
) -> Result<ArReport> {
    info!("time series forecasting using AR");
    debug!(?params, "parameters");

    let series = DataLoader::from_csv(path)?;
    let (train, test) = split_for_forecast(&series, params.split_ratio)?;

    let model = AutoRegressive::new(params.ar_ic).train(&train)?;
    let start = train.len();
    let end = start + test.len() - 1;
    let forecast = model.predict(start, end)?;
    let rmse = root_mean_squared_error(forecast.values(), &test);

    let ic_code = params.ar_ic.map(|ic| ic.code()).unwrap_or_default();
    let forecast_plot = plots::draw_forecast(
        series.name(),
        &format!("forecast_ar_{}_{}", ic_code, params.split_ratio),
        &test,
        forecast.values(),
        ctx.output_dir()?,
    )?;

    info!("time series '{}' forecasted successfully using AR!", series.name());
    Ok(ArReport {
        split_ratio: params.split_ratio,
        ic: params
            .ar_ic
            .map(|ic| ic.display_name().to_string())
            .unwrap_or_default(),
        forecast_plot,
        lag: model.lag(),
        tobs: model.total_observations(),
        rmse,
    })
}

/// Fit an ARIMA(p, d, q) on the training prefix and forecast the test suffix
pub fn forecast_arima(
    path: &Path,
    params: &ForecastParameters,
    ctx: &AnalysisContext,
) -> Result<ArimaReport> {
    info!("time series forecasting using ARIMA");
    debug!(?params, "parameters");

    let series = DataLoader::from_csv(path)?;
    let (train, test) = split_for_forecast(&series, params.split_ratio)?;

    let (p, d, q) = params.arima_order();
    let model = Arima::new(p, d, q).train(&train)?;
    let forecast = model.forecast(test.len())?;
    let rmse = root_mean_squared_error(forecast.values(), &test);
    let criteria = model.information_criteria();

    let forecast_plot = plots::draw_forecast(
        series.name(),
        &format!("forecast_arima_{}_{}_{}", p, d, q),
        &test,
        forecast.values(),
        ctx.output_dir()?,
    )?;

    info!("time series '{}' forecasted successfully using ARIMA!", series.name());
    Ok(ArimaReport {
        split_ratio: params.split_ratio,
        ar: p,
        i: d,
        ma: q,
        forecast_plot,
        tobs: model.total_observations(),
        aic: criteria.aic,
        bic: criteria.bic,
        hqic: criteria.hqic,
        rmse,
    })
}

/// Fit every order in the search grid and report the best per criterion
///
/// Orders that fail to fit are skipped.
pub fn forecast_arima_test_params(
    path: &Path,
    params: &ForecastParameters,
    _ctx: &AnalysisContext,
) -> Result<ParameterSearchReport> {
    let series = DataLoader::from_csv(path)?;
    let (train, _test) = split_for_forecast(&series, params.split_ratio)?;

    let mut report = ParameterSearchReport::default();
    for p in SEARCH_ORDERS {
        for d in SEARCH_ORDERS {
            for q in SEARCH_ORDERS {
                match Arima::new(p, d, q).train(&train) {
                    Ok(model) => report.offer((p, d, q), &model.information_criteria()),
                    Err(err) => warn!(p, d, q, error = %err, "arima order skipped"),
                }
            }
        }
    }

    info!("arima '{}' parameters testing!", series.name());
    Ok(report)
}
