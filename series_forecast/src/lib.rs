//! # Series Forecast
//!
//! Univariate time series analysis and short-horizon forecasting.
//!
//! ## Features
//!
//! - CSV ingestion of `date,value` files with type checks and cleaning
//!   (missing timestamps dropped, zeros and gaps interpolated, one decimal)
//! - Descriptive statistics and outlier detection
//! - SVG plots: trend, histogram, autocorrelation and forecast vs. real
//! - Forecasting models: AR with information-criterion lag selection and
//!   ARIMA(p, d, q) fitted by conditional sum of squares
//! - Accuracy metrics (MSE, RMSE, MAE, MAPE, SMAPE)
//!
//! ## Quick Start
//!
//! ```no_run
//! use series_forecast::controller::{forecast_ar, AnalysisContext};
//! use series_forecast::params::ForecastParameters;
//! use std::path::Path;
//!
//! let ctx = AnalysisContext::new("static");
//! let params = ForecastParameters::default();
//! let report = forecast_ar(Path::new("data/sales.csv"), &params, &ctx)?;
//! println!("lag {} rmse {}", report.lag, report.rmse);
//! # Ok::<(), series_forecast::ForecastError>(())
//! ```

pub mod controller;
pub mod data;
pub mod error;
pub mod files;
pub mod metrics;
pub mod models;
pub mod params;
pub mod plots;

// Re-export commonly used types
pub use crate::controller::{AnalysisContext, AnalysisReport, ArReport, ArimaReport, ParameterSearchReport};
pub use crate::data::{DataLoader, SeriesInfo, TimeSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::files::FileManager;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::params::ForecastParameters;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
