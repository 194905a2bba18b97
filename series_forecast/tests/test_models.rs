use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rstest::rstest;
use series_forecast::ForecastError;
use series_forecast::models::{
    Arima, AutoRegressive, ForecastModel, InformationCriterion, TrainedForecastModel,
};

// AR(1) with intercept: y[t] = c + phi * y[t-1] + e[t]
fn simulate_ar1(c: f64, phi: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut data = Vec::with_capacity(n);
    let mut previous = c / (1.0 - phi);
    for _ in 0..n {
        previous = c + phi * previous + noise.sample(&mut rng);
        data.push(previous);
    }
    data
}

#[rstest]
#[case(InformationCriterion::Aic)]
#[case(InformationCriterion::Bic)]
#[case(InformationCriterion::Hqic)]
fn test_ar_recovers_simulated_process(#[case] ic: InformationCriterion) {
    let data = simulate_ar1(5.0, 0.7, 500, 2024);
    let model = AutoRegressive::new(Some(ic)).train(&data).unwrap();

    assert!(model.lag() >= 1);
    assert!(model.lag() <= AutoRegressive::max_lag(data.len()));
    assert_abs_diff_eq!(model.coefficients()[0], 0.7, epsilon = 0.1);
    assert_abs_diff_eq!(model.sigma2(), 1.0, epsilon = 0.25);
}

#[test]
fn test_ar_without_criterion_uses_max_lag() {
    let data = simulate_ar1(1.0, 0.3, 100, 9);
    let model = AutoRegressive::new(None).train(&data).unwrap();
    assert_eq!(model.lag(), 12);
    assert_eq!(model.coefficients().len(), 12);
    assert_eq!(model.total_observations(), 100);
}

#[test]
fn test_ar_forecast_reverts_to_mean() {
    let data = simulate_ar1(5.0, 0.5, 400, 77);
    let model = AutoRegressive::new(Some(InformationCriterion::Bic))
        .train(&data)
        .unwrap();

    let forecast = model.forecast(200).unwrap();
    let long_run = forecast.values()[199];
    assert_abs_diff_eq!(long_run, 10.0, epsilon = 1.0);
}

#[test]
fn test_arima_continues_linear_trend() {
    let data: Vec<f64> = (0..50)
        .map(|t| 100.0 + 1.5 * t as f64 + 0.05 * (1.3 * t as f64).sin())
        .collect();
    let model = Arima::new(1, 1, 0).train(&data).unwrap();

    let forecast = model.forecast(5).unwrap();
    for (step, value) in forecast.values().iter().enumerate() {
        let expected = 100.0 + 1.5 * (50 + step) as f64;
        assert_abs_diff_eq!(*value, expected, epsilon = 0.5);
    }
    assert_eq!(model.total_observations(), 50);
}

#[test]
fn test_arima_predict_range() {
    let data = simulate_ar1(2.0, 0.4, 120, 5);
    let model = Arima::new(1, 0, 1).train(&data).unwrap();

    let predicted = model.predict(120, 129).unwrap();
    assert_eq!(predicted.horizons(), 10);
    assert!(model.predict(0, 10).is_err());
}

#[test]
fn test_arima_reports_finite_criteria() {
    let data = simulate_ar1(2.0, 0.4, 150, 8);
    let criteria = Arima::new(2, 1, 2)
        .train(&data)
        .unwrap()
        .information_criteria();

    assert!(criteria.aic.is_finite());
    assert!(criteria.bic > criteria.aic);
}

#[rstest]
#[case::constant(vec![12.0; 60], (0, 1, 0))]
#[case::constant_with_terms(vec![12.0; 60], (2, 1, 1))]
#[case::linear((0..60).map(|t| 5.0 + 2.0 * t as f64).collect(), (0, 1, 0))]
#[case::linear_second_difference((0..60).map(|t| 5.0 + 2.0 * t as f64).collect(), (0, 2, 0))]
fn test_arima_rejects_exact_fit(#[case] data: Vec<f64>, #[case] order: (usize, usize, usize)) {
    let (p, d, q) = order;
    let err = Arima::new(p, d, q).train(&data).unwrap_err();
    assert!(matches!(err, ForecastError::ForecastingError(_)), "{}", err);
}

#[test]
fn test_arima_order_overflow_is_invalid_parameter() {
    let err = Arima::new(usize::MAX, 1, 1).train(&[1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));

    let err = Arima::new(1, usize::MAX, 1).train(&[1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));
}
