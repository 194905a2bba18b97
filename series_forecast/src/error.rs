//! Error types for the series_forecast crate

use polars::prelude::PolarsError;
use series_math::MathError;
use thiserror::Error;

/// Custom error types for the series_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data loading, typing or cleaning
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from rendering a plot
    #[error("Plot error: {0}")]
    PlotError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl ForecastError {
    /// True for errors caused by the caller's input rather than by processing
    pub fn is_client_error(&self) -> bool {
        matches!(self, ForecastError::InvalidParameter(_))
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_error_conversion() {
        let err: ForecastError = MathError::InvalidInput("bad lag".to_string()).into();
        assert!(matches!(err, ForecastError::MathError(_)));
        assert!(err.to_string().contains("bad lag"));
    }

    #[test]
    fn test_client_errors() {
        assert!(ForecastError::InvalidParameter("split_ratio".to_string()).is_client_error());
        assert!(!ForecastError::DataError("empty".to_string()).is_client_error());
    }
}
