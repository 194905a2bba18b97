use series_forecast::models::ar::{AutoRegressive, InformationCriterion};
use series_forecast::models::arima::Arima;
use series_forecast::{ForecastModel, TimeSeries, TrainedForecastModel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Monthly series with a trend and a yearly swing
    let dates: Vec<String> = (0..96)
        .map(|i| format!("{:04}-{:02}-01", 2015 + i / 12, i % 12 + 1))
        .collect();
    let values: Vec<f64> = (0..96)
        .map(|i| 100.0 + 0.8 * i as f64 + 12.0 * (i as f64 * std::f64::consts::PI / 6.0).sin())
        .collect();
    let date_refs: Vec<&str> = dates.iter().map(String::as_str).collect();

    let series = TimeSeries::new("monthly", &date_refs, &values)?;
    println!("{}", series);

    let (train, test) = series.split(0.8);
    println!("Training on {} points, holding out {}", train.len(), test.len());

    let ar = AutoRegressive::new(Some(InformationCriterion::Aic)).train(&train)?;
    let ar_forecast = ar.forecast(test.len())?;
    println!("{} chose lag {}", ar.name(), ar.lag());

    let arima = Arima::new(2, 1, 1).train(&train)?;
    let arima_forecast = arima.forecast(test.len())?;
    println!("{} aic {:.2}", arima.name(), arima.information_criteria().aic);

    for ((real, a), b) in test.iter().zip(ar_forecast.values()).zip(arima_forecast.values()) {
        println!("real {:8.2}  ar {:8.2}  arima {:8.2}", real, a, b);
    }

    Ok(())
}
