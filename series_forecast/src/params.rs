//! Request parameters for the forecasting operations

use crate::error::{ForecastError, Result};
use crate::models::InformationCriterion;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;
pub const DEFAULT_ARIMA_AR: usize = 10;
pub const DEFAULT_ARIMA_I: usize = 1;
pub const DEFAULT_ARIMA_MA: usize = 2;

/// Typed forecasting parameters
///
/// Fields are coerced independently from loosely typed input. There is no
/// cross-field validation: a split ratio outside `[0, 1]` is accepted here
/// and only surfaces later as an empty training or test subset.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastParameters {
    /// Share of observations used for training
    pub split_ratio: f64,
    /// Criterion for AR lag selection, `None` uses the maximum lag
    pub ar_ic: Option<InformationCriterion>,
    /// ARIMA autoregressive order (p)
    pub arima_ar: usize,
    /// ARIMA differencing order (d)
    pub arima_i: usize,
    /// ARIMA moving average order (q)
    pub arima_ma: usize,
}

impl Default for ForecastParameters {
    fn default() -> Self {
        Self {
            split_ratio: DEFAULT_SPLIT_RATIO,
            ar_ic: None,
            arima_ar: DEFAULT_ARIMA_AR,
            arima_i: DEFAULT_ARIMA_I,
            arima_ma: DEFAULT_ARIMA_MA,
        }
    }
}

impl ForecastParameters {
    /// Coerce a flat field map; missing, null and empty values take defaults
    pub fn from_map(fields: &HashMap<String, Value>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            split_ratio: float_field(fields, "split_ratio")?.unwrap_or(defaults.split_ratio),
            ar_ic: text_field(fields, "ar_ic")?
                .map(|code| InformationCriterion::from_str(&code))
                .transpose()?,
            arima_ar: count_field(fields, "arima_ar")?.unwrap_or(defaults.arima_ar),
            arima_i: count_field(fields, "arima_i")?.unwrap_or(defaults.arima_i),
            arima_ma: count_field(fields, "arima_ma")?.unwrap_or(defaults.arima_ma),
        })
    }

    /// ARIMA order as `(p, d, q)`
    pub fn arima_order(&self) -> (usize, usize, usize) {
        (self.arima_ar, self.arima_i, self.arima_ma)
    }
}

/// The field's value unless it is absent, null or a blank string
fn present<'a>(fields: &'a HashMap<String, Value>, name: &str) -> Option<&'a Value> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

fn invalid(name: &str, value: &Value, expected: &str) -> ForecastError {
    ForecastError::InvalidParameter(format!("{} must be {}, got {}", name, expected, value))
}

fn float_field(fields: &HashMap<String, Value>, name: &str) -> Result<Option<f64>> {
    let Some(value) = present(fields, name) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| invalid(name, value, "a number"))
}

fn count_field(fields: &HashMap<String, Value>, name: &str) -> Result<Option<usize>> {
    let Some(value) = present(fields, name) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| invalid(name, value, "a non-negative integer"))
}

fn text_field(fields: &HashMap<String, Value>, name: &str) -> Result<Option<String>> {
    match present(fields, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(value) => Err(invalid(name, value, "a string")),
    }
}
