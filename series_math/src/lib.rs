//! # Series Math
//!
//! Numeric kernels used by the time series analysis and forecasting crates.
//! This crate provides descriptive statistics, autocorrelation, differencing
//! and the small amount of linear algebra and optimisation needed to fit
//! autoregressive models.

use thiserror::Error;

pub mod correlation;
pub mod differencing;
pub mod interpolation;
pub mod linalg;
pub mod optimize;
pub mod stats;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Fails with [`MathError::InsufficientData`] when `values` holds fewer than `needed` points.
pub(crate) fn ensure_len(values: &[f64], needed: usize, what: &str) -> Result<()> {
    if values.len() < needed {
        return Err(MathError::InsufficientData(format!(
            "{} needs at least {} values, got {}",
            what,
            needed,
            values.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_len() {
        assert!(ensure_len(&[1.0, 2.0], 2, "mean").is_ok());

        let err = ensure_len(&[1.0], 2, "variance").unwrap_err();
        assert_eq!(
            err,
            MathError::InsufficientData("variance needs at least 2 values, got 1".to_string())
        );
    }
}
