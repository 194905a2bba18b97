//! Time series data handling: typing, cleaning and descriptive statistics

use crate::error::{ForecastError, Result};
use crate::files::FileManager;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use series_math::interpolation::{linear_fill, round_to};
use series_math::{differencing, stats};
use std::path::Path;
use tracing::debug;

/// Name of the timestamp column in uploaded files
pub const DATE_COLUMN: &str = "date";
/// Name of the observation column in uploaded files
pub const VALUE_COLUMN: &str = "value";

/// Values are unified to this many decimal places
const DECIMALS: i32 = 1;

/// Descriptive statistics shown on the analysis page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesInfo {
    pub minimum_value: f64,
    pub maximum_value: f64,
    pub average_value: f64,
    pub standard_deviation_value: f64,
    pub interquartile_value: f64,
    pub median_value: f64,
    pub observations: usize,
    pub first_date: String,
    pub last_date: String,
}

/// A cleaned univariate time series
///
/// Construction validates column types, drops rows without a timestamp,
/// interpolates zero and missing values and rounds every value to one
/// decimal place. After that no zero or NaN value remains.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    /// Name of the series, usually the stem of the source file
    name: String,
    /// Timestamps exactly as they appeared in the source
    dates: Vec<String>,
    /// Parsed timestamps
    timestamps: Vec<NaiveDateTime>,
    /// Cleaned observations
    values: Vec<f64>,
}

/// Data loader for time series files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load and clean a time series from a CSV file with `date` and `value` columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
        let path = path.as_ref();
        let df = FileManager::read_file(path)?;
        let name = FileManager::series_name(path)?;
        TimeSeries::from_dataframe(&df, &name)
    }

    /// Create a time series from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame, name: &str) -> Result<TimeSeries> {
        TimeSeries::from_dataframe(df, name)
    }
}

impl TimeSeries {
    /// Create a time series from string dates and values (mostly for tests)
    pub fn new(name: &str, dates: &[&str], values: &[f64]) -> Result<Self> {
        Self::from_records(
            name,
            dates.iter().map(|d| Some(d.to_string())).collect(),
            values.iter().map(|v| Some(*v)).collect(),
        )
    }

    /// Validate and clean the `date` / `value` columns of a DataFrame
    pub fn from_dataframe(df: &DataFrame, name: &str) -> Result<Self> {
        let date_column = df.column(DATE_COLUMN).map_err(|_| {
            ForecastError::DataError(format!("Missing '{}' column", DATE_COLUMN))
        })?;
        let value_column = df.column(VALUE_COLUMN).map_err(|_| {
            ForecastError::DataError(format!("Missing '{}' column", VALUE_COLUMN))
        })?;

        if date_column.dtype() != &DataType::Utf8 {
            return Err(ForecastError::DataError(format!(
                "Column '{}' must hold text timestamps, found {}",
                DATE_COLUMN,
                date_column.dtype()
            )));
        }
        if !value_column.dtype().is_numeric() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' must be numeric, found {}",
                VALUE_COLUMN,
                value_column.dtype()
            )));
        }

        let dates: Vec<Option<String>> = date_column
            .utf8()?
            .into_iter()
            .map(|d| d.map(|s| s.trim().to_string()))
            .collect();

        let as_float = value_column.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = as_float.f64()?.into_iter().collect();

        Self::from_records(name, dates, values)
    }

    /// Shared cleaning path for every constructor
    fn from_records(name: &str, dates: Vec<Option<String>>, values: Vec<Option<f64>>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Date and value columns differ in length ({} vs {})",
                dates.len(),
                values.len()
            )));
        }

        if let Some(negative) = values.iter().flatten().find(|v| **v < 0.0) {
            return Err(ForecastError::ValidationError(format!(
                "Values must not be negative, found {}",
                negative
            )));
        }

        // drop rows without a timestamp
        let (dates, values): (Vec<String>, Vec<Option<f64>>) = dates
            .into_iter()
            .zip(values)
            .filter_map(|(d, v)| d.filter(|s| !s.is_empty()).map(|d| (d, v)))
            .unzip();

        if dates.is_empty() {
            return Err(ForecastError::DataError(
                "Time series has no rows with a timestamp".to_string(),
            ));
        }

        let values = complement(&values)?;
        let values = unify(values)?;

        let timestamps = dates
            .iter()
            .map(|d| parse_timestamp(d))
            .collect::<Result<Vec<_>>>()?;

        debug!(name, observations = values.len(), "time series cleaned");

        Ok(Self {
            name: name.to_string(),
            dates,
            timestamps,
            values,
        })
    }

    /// Name of the series
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source timestamps as text
    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// Parsed timestamps
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Cleaned values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All descriptive statistics in one record
    pub fn info(&self) -> Result<SeriesInfo> {
        let summary = stats::describe(&self.values)?;
        Ok(SeriesInfo {
            minimum_value: summary.min,
            maximum_value: summary.max,
            average_value: summary.mean,
            standard_deviation_value: summary.std_dev,
            interquartile_value: summary.interquartile_range,
            median_value: summary.median,
            observations: summary.count,
            first_date: self.dates.first().cloned().unwrap_or_default(),
            last_date: self.dates.last().cloned().unwrap_or_default(),
        })
    }

    pub fn min_value(&self) -> Result<f64> {
        Ok(stats::min(&self.values)?)
    }

    pub fn max_value(&self) -> Result<f64> {
        Ok(stats::max(&self.values)?)
    }

    pub fn average_value(&self) -> Result<f64> {
        Ok(stats::mean(&self.values)?)
    }

    /// Sample standard deviation
    pub fn std_deviation_value(&self) -> Result<f64> {
        Ok(stats::sample_std_dev(&self.values)?)
    }

    pub fn median_value(&self) -> Result<f64> {
        Ok(stats::median(&self.values)?)
    }

    /// Difference between the third and first quartile (midpoint rule)
    pub fn interquartile_value(&self) -> Result<f64> {
        Ok(stats::interquartile_range_midpoint(&self.values)?)
    }

    /// Quantile `q` of the values
    pub fn quantile(&self, q: f64) -> Result<f64> {
        Ok(stats::quantile(&self.values, q)?)
    }

    /// Values outside the Tukey fences `Q1 - 1.5 IQR` and `Q3 + 1.5 IQR`
    ///
    /// Points under the lower fence are listed first, then points over the
    /// upper fence, each group in series order.
    pub fn distant_points(&self) -> Result<Vec<f64>> {
        let summary = stats::describe(&self.values)?;
        let lower_fence = summary.q1 - 1.5 * summary.interquartile_range;
        let upper_fence = summary.q3 + 1.5 * summary.interquartile_range;

        let lower = self.values.iter().filter(|v| **v < lower_fence);
        let higher = self.values.iter().filter(|v| **v > upper_fence);
        Ok(lower.chain(higher).copied().collect())
    }

    /// Split values into a training prefix and a test suffix by position
    ///
    /// The boundary is `floor(ratio * len)`. A ratio outside `[0, 1]`
    /// yields two empty subsets rather than an error.
    pub fn split(&self, ratio: f64) -> (Vec<f64>, Vec<f64>) {
        if !(0.0..=1.0).contains(&ratio) {
            return (Vec::new(), Vec::new());
        }
        let threshold = ((ratio * self.len() as f64).floor() as usize).min(self.len());
        (
            self.values[..threshold].to_vec(),
            self.values[threshold..].to_vec(),
        )
    }

    /// Lag-`periods` differences with the undefined leading rows removed
    pub fn difference(&self, periods: usize) -> Result<Vec<f64>> {
        Ok(differencing::difference(&self.values, periods)?)
    }
}

impl std::fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:>20} {:>12}", DATE_COLUMN, VALUE_COLUMN)?;
        for (date, value) in self.dates.iter().zip(self.values.iter()) {
            writeln!(f, "{:>20} {:>12.1}", date, value)?;
        }
        Ok(())
    }
}

/// Treat zero and NaN as gaps and fill them by linear interpolation
fn complement(values: &[Option<f64>]) -> Result<Vec<f64>> {
    let gaps: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.filter(|x| !x.is_nan() && *x != 0.0))
        .collect();

    linear_fill(&gaps).map_err(|_| {
        ForecastError::DataError("Value column has no usable observations".to_string())
    })
}

/// Round to one decimal; anything that rounds to zero is interpolated again
///
/// A series whose values all lie below 0.05 has nothing left to interpolate
/// from and is rejected with `DataError`.
fn unify(values: Vec<f64>) -> Result<Vec<f64>> {
    let rounded: Vec<f64> = values.iter().map(|v| round_to(*v, DECIMALS)).collect();
    if rounded.iter().all(|v| *v != 0.0) {
        return Ok(rounded);
    }
    if rounded.iter().all(|v| *v == 0.0) {
        return Err(ForecastError::DataError(format!(
            "Every value rounds to zero at {} decimal(s)",
            DECIMALS
        )));
    }

    let gaps: Vec<Option<f64>> = rounded.into_iter().map(Some).collect();
    Ok(complement(&gaps)?
        .into_iter()
        .map(|v| round_to(v, DECIMALS))
        .collect())
}

/// Parse the timestamp formats commonly found in exported series
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }

    parse_date(text)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ForecastError::DataError(format!("Unrecognised timestamp '{}'", text)))
}

/// Calendar dates down to yearly resolution
fn parse_date(text: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").ok())
        .or_else(|| {
            if text.len() != 4 {
                return None;
            }
            text.parse::<i32>()
                .ok()
                .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn sample() -> TimeSeries {
        TimeSeries::new(
            "sample",
            &["2023-01-01", "2023-01-02", "2023-01-03", "2023-01-04", "2023-01-05"],
            &[10.0, 12.0, 11.0, 13.0, 14.0],
        )
        .unwrap()
    }

    #[test]
    fn test_zero_and_missing_values_are_interpolated() {
        let series = TimeSeries::from_records(
            "gappy",
            vec![
                Some("2023-01".to_string()),
                Some("2023-02".to_string()),
                Some("2023-03".to_string()),
                Some("2023-04".to_string()),
            ],
            vec![Some(1.0), Some(0.0), None, Some(4.0)],
        )
        .unwrap();

        assert_eq!(series.values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rows_without_dates_are_dropped() {
        let series = TimeSeries::from_records(
            "dated",
            vec![Some("2023-01-01".to_string()), None, Some("".to_string()), Some("2023-01-04".to_string())],
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
        )
        .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), &[1.0, 4.0]);
        assert_eq!(series.dates(), &["2023-01-01".to_string(), "2023-01-04".to_string()]);
    }

    #[test]
    fn test_values_are_rounded_and_never_zero() {
        let series = TimeSeries::new(
            "tiny",
            &["2023-01-01", "2023-01-02", "2023-01-03"],
            &[1.24, 0.01, 2.0],
        )
        .unwrap();

        // 0.01 rounds to zero and is interpolated again
        assert_eq!(series.values(), &[1.2, 1.6, 2.0]);
        assert!(series.values().iter().all(|v| *v > 0.0));
    }

    #[test]
    fn test_values_all_rounding_to_zero_are_rejected() {
        let result = TimeSeries::new(
            "tiny",
            &["2023-01-01", "2023-01-02", "2023-01-03"],
            &[0.01, 0.02, 0.03],
        );
        match result {
            Err(ForecastError::DataError(message)) => assert!(message.contains("rounds to zero")),
            other => panic!("expected a data error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_values_are_rejected() {
        let result = TimeSeries::new("neg", &["2023-01-01", "2023-01-02"], &[1.0, -2.0]);
        assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    }

    #[test]
    fn test_unparseable_dates_are_rejected() {
        let result = TimeSeries::new("bad", &["yesterday"], &[1.0]);
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }

    #[test]
    fn test_info() {
        let info = sample().info().unwrap();
        assert_eq!(info.minimum_value, 10.0);
        assert_eq!(info.maximum_value, 14.0);
        assert_relative_eq!(info.average_value, 12.0);
        assert_relative_eq!(info.standard_deviation_value, 2.5f64.sqrt(), epsilon = 1e-12);
        assert_eq!(info.median_value, 12.0);
        // sorted [10, 11, 12, 13, 14], quartile positions 1 and 3 are exact
        assert_eq!(info.interquartile_value, 2.0);
        assert_eq!(info.observations, 5);
        assert_eq!(info.first_date, "2023-01-01");
        assert_eq!(info.last_date, "2023-01-05");
    }

    #[test]
    fn test_split() {
        let series = sample();
        let (train, test) = series.split(0.8);
        assert_eq!(train, vec![10.0, 12.0, 11.0, 13.0]);
        assert_eq!(test, vec![14.0]);

        let (train, test) = series.split(0.5);
        assert_eq!(train.len(), 2);
        assert_eq!(test.len(), 3);
    }

    #[test]
    fn test_split_out_of_range_is_empty() {
        let series = sample();
        for ratio in [-0.2, 1.5, f64::NAN] {
            let (train, test) = series.split(ratio);
            assert!(train.is_empty());
            assert!(test.is_empty());
        }
    }

    #[test]
    fn test_distant_points() {
        let series = TimeSeries::new(
            "outliers",
            &[
                "2023-01-01", "2023-01-02", "2023-01-03", "2023-01-04", "2023-01-05",
                "2023-01-06", "2023-01-07", "2023-01-08",
            ],
            &[10.0, 11.0, 10.5, 50.0, 10.2, 0.5, 11.1, 10.8],
        )
        .unwrap();

        assert_eq!(series.distant_points().unwrap(), vec![0.5, 50.0]);
    }

    #[test]
    fn test_difference() {
        let series = sample();
        assert_eq!(series.difference(1).unwrap(), vec![2.0, -1.0, 2.0, 1.0]);
        assert_eq!(series.difference(2).unwrap(), vec![1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        for text in [
            "2023-05-01",
            "2023/05/01",
            "2023-05",
            "2023-05-01 00:00:00",
            "2023-05-01T00:00:00",
            "2023-05-01T00:00:00Z",
        ] {
            let parsed = parse_timestamp(text).unwrap();
            assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(), "{}", text);
        }
        assert_eq!(
            parse_timestamp("1999").unwrap().date(),
            NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()
        );
    }
}
