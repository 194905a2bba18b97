//! # Timescope
//!
//! `timescope` bundles the workspace crates behind one dependency:
//!
//! - [`series_math`]: numeric kernels (statistics, autocorrelation,
//!   differencing, least squares, Nelder–Mead)
//! - [`series_forecast`]: CSV ingestion, plots, AR/ARIMA models and the
//!   analysis pipelines
//!
//! The HTTP service and command line live in the `series_web` crate.
//!
//! ## Example
//!
//! ```
//! use timescope::series_math::stats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0];
//! assert_eq!(stats::mean(&values).unwrap(), 2.5);
//! ```

pub use series_forecast;
pub use series_math;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
