//! SVG rendering of series, distributions, autocorrelation and forecasts
//!
//! Every function writes one file into `out_dir` and returns its file name.
//! Names depend only on the series name and the parameters, so repeating a
//! request overwrites the earlier artifact.

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use plotters::prelude::*;
use series_math::correlation::{autocorrelation, confidence_band};
use std::fmt::Display;
use std::path::Path;
use tracing::debug;

const SIZE: (u32, u32) = (1000, 500);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);
const HISTOGRAM_BINS: usize = 10;
/// Significance level of the autocorrelation band
const ACF_ALPHA: f64 = 0.05;

fn plot_error<E: Display>(err: E) -> ForecastError {
    ForecastError::PlotError(err.to_string())
}

/// Axis label for the observed quantity of well known datasets
pub fn value_label(series_name: &str) -> &'static str {
    match series_name {
        "amazon_stock_prices" => "stock price (USD)",
        "monthly_beer_production_in_austria" => "beer production (million HL)",
        _ => "value",
    }
}

/// Value range padded by 5% so lines do not touch the frame
fn padded_range(values: impl Iterator<Item = f64> + Clone) -> std::ops::Range<f64> {
    let low = values.clone().fold(f64::INFINITY, f64::min);
    let high = values.fold(f64::NEG_INFINITY, f64::max);
    if !low.is_finite() || !high.is_finite() {
        return 0.0..1.0;
    }
    let pad = ((high - low) * 0.05).max(0.5);
    (low - pad)..(high + pad)
}

/// Line plot of the series over time
pub fn draw_series(series: &TimeSeries, out_dir: &Path) -> Result<String> {
    let file_name = format!("{}_plot.svg", series.name());
    let path = out_dir.join(&file_name);
    let dates = series.dates();
    let values = series.values();

    let root = SVGBackend::new(&path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let x_max = values.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} over time", series.name()), CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, padded_range(values.iter().copied()))
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("date")
        .y_desc(value_label(series.name()))
        .x_labels(8)
        .x_label_formatter(&|x| {
            let index = x.round().max(0.0) as usize;
            dates.get(index).cloned().unwrap_or_default()
        })
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &BLUE,
        ))
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    debug!(file = %file_name, "series plot written");
    Ok(file_name)
}

/// Bin edges and counts for equal-width bins over the value range
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let width = if high > low { (high - low) / bins as f64 } else { 1.0 };
    let mut counts = vec![0usize; bins];
    for v in values {
        // the maximum belongs to the last, closed bin
        let index = (((v - low) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = low + i as f64 * width;
            (start, start + width, count)
        })
        .collect()
}

/// Histogram of the values with ten equal-width bins
pub fn draw_histogram(series: &TimeSeries, out_dir: &Path) -> Result<String> {
    let file_name = format!("{}_histogram.svg", series.name());
    let path = out_dir.join(&file_name);
    let bins = histogram_bins(series.values(), HISTOGRAM_BINS);

    let x_low = bins.first().map(|b| b.0).unwrap_or(0.0);
    let x_high = bins.last().map(|b| b.1).unwrap_or(1.0);
    let y_high = bins.iter().map(|b| b.2).max().unwrap_or(0) as f64 * 1.1 + 1.0;

    let root = SVGBackend::new(&path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} distribution", series.name()), CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_low..x_high, 0f64..y_high)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc(value_label(series.name()))
        .y_desc("count")
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(bins.iter().map(|(start, end, count)| {
            Rectangle::new([(*start, 0.0), (*end, *count as f64)], BLUE.mix(0.6).filled())
        }))
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    debug!(file = %file_name, "histogram written");
    Ok(file_name)
}

/// Autocorrelation stems for lags `0..=lags` with a 95% confidence band
pub fn draw_autocorrelation(series: &TimeSeries, lags: usize, out_dir: &Path) -> Result<String> {
    let file_name = format!("{}_autocorrelation_{}.svg", series.name(), lags);
    let path = out_dir.join(&file_name);

    let acf = autocorrelation(series.values(), lags)?;
    let band = confidence_band(&acf, series.len(), ACF_ALPHA)?;
    let x_max = acf.len() as f64;

    let root = SVGBackend::new(&path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} autocorrelation", series.name()), CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..x_max, -1.1f64..1.1f64)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("lag")
        .y_desc("autocorrelation")
        .draw()
        .map_err(plot_error)?;

    let band_style = BLUE.mix(0.3);
    chart
        .draw_series(LineSeries::new(
            band.iter().enumerate().map(|(lag, b)| (lag as f64, *b)),
            band_style,
        ))
        .map_err(plot_error)?;
    chart
        .draw_series(LineSeries::new(
            band.iter().enumerate().map(|(lag, b)| (lag as f64, -*b)),
            band_style,
        ))
        .map_err(plot_error)?;

    chart
        .draw_series(acf.iter().enumerate().map(|(lag, r)| {
            PathElement::new(vec![(lag as f64, 0.0), (lag as f64, *r)], BLACK)
        }))
        .map_err(plot_error)?;
    chart
        .draw_series(
            acf.iter()
                .enumerate()
                .map(|(lag, r)| Circle::new((lag as f64, *r), 3, BLUE.filled())),
        )
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    debug!(file = %file_name, lags, "autocorrelation plot written");
    Ok(file_name)
}

/// Held-out values against their forecast
///
/// Real values are drawn in blue and predictions in red, with the legend in
/// the upper right corner. `file_stem` carries the model and its parameters.
pub fn draw_forecast(
    series_name: &str,
    file_stem: &str,
    real: &[f64],
    predicted: &[f64],
    out_dir: &Path,
) -> Result<String> {
    let file_name = format!("{}_{}.svg", series_name, file_stem);
    let path = out_dir.join(&file_name);

    let x_max = real.len().max(predicted.len()).saturating_sub(1).max(1) as f64;
    let y_range = padded_range(real.iter().chain(predicted.iter()).copied());

    let root = SVGBackend::new(&path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} forecast", series_name), CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, y_range)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("step")
        .y_desc(value_label(series_name))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(
            real.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &BLUE,
        ))
        .map_err(plot_error)?
        .label("real")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            predicted.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &RED,
        ))
        .map_err(plot_error)?
        .label("predicted")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    debug!(file = %file_name, "forecast plot written");
    Ok(file_name)
}
