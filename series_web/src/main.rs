//! `timescope` command line: serve the HTTP API or run one pipeline on a CSV file

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use series_forecast::controller;
use series_forecast::models::InformationCriterion;
use series_forecast::params::{
    DEFAULT_ARIMA_AR, DEFAULT_ARIMA_I, DEFAULT_ARIMA_MA, DEFAULT_SPLIT_RATIO,
};
use series_forecast::{AnalysisContext, ForecastParameters};
use series_web::config::{Settings, ENV_CONFIG};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Time series analysis and forecasting service", long_about = None)]
struct Cli {
    /// TOML configuration file (falls back to TIMESCOPE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory plot artifacts are written to
    #[arg(long, global = true)]
    static_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Print statistics of a CSV file and draw its plots
    Analyse {
        csv: PathBuf,
    },
    /// Forecast the held-out part of a CSV file with an AR model
    ForecastAr {
        csv: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SPLIT_RATIO)]
        split_ratio: f64,
        /// Lag selection criterion: aic, bic or hqic
        #[arg(long)]
        ic: Option<String>,
    },
    /// Forecast the held-out part of a CSV file with an ARIMA model
    ForecastArima {
        csv: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SPLIT_RATIO)]
        split_ratio: f64,
        /// Model order as p,d,q
        #[arg(long, value_parser = parse_order)]
        order: Option<(usize, usize, usize)>,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on, e.g. 0.0.0.0:5000
    #[arg(long)]
    bind: Option<String>,
    /// Directory uploaded files are stored in
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn parse_order(text: &str) -> std::result::Result<(usize, usize, usize), String> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid order '{text}': {err}"))?;
    match parts.as_slice() {
        [p, d, q] => Ok((*p, *d, *q)),
        _ => Err(format!("order must have three parts, got '{text}'")),
    }
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_file = cli
        .config
        .clone()
        .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));
    let mut settings =
        Settings::load(config_file.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = cli.static_dir {
        settings.static_dir = dir;
    }

    series_web::logging::init(&settings)?;
    std::fs::create_dir_all(&settings.static_dir)
        .with_context(|| format!("failed to create {}", settings.static_dir.display()))?;

    let ctx = AnalysisContext::new(&settings.static_dir).with_acf_lags(settings.acf_lags);

    match cli.command {
        Command::Serve(args) => {
            if let Some(bind) = args.bind {
                settings.bind = bind;
            }
            if let Some(dir) = args.data_dir {
                settings.data_dir = dir;
            }
            info!(bind = %settings.bind, "starting timescope server");
            series_web::serve(settings).await
        }
        Command::Analyse { csv } => {
            let report =
                tokio::task::spawn_blocking(move || controller::analysis(&csv, &ctx)).await??;
            print_json(&report)
        }
        Command::ForecastAr {
            csv,
            split_ratio,
            ic,
        } => {
            let params = ForecastParameters {
                split_ratio,
                ar_ic: ic
                    .map(|code| code.parse::<InformationCriterion>())
                    .transpose()?,
                ..ForecastParameters::default()
            };
            let report =
                tokio::task::spawn_blocking(move || controller::forecast_ar(&csv, &params, &ctx))
                    .await??;
            print_json(&report)
        }
        Command::ForecastArima {
            csv,
            split_ratio,
            order,
        } => {
            let (arima_ar, arima_i, arima_ma) =
                order.unwrap_or((DEFAULT_ARIMA_AR, DEFAULT_ARIMA_I, DEFAULT_ARIMA_MA));
            let params = ForecastParameters {
                split_ratio,
                arima_ar,
                arima_i,
                arima_ma,
                ..ForecastParameters::default()
            };
            let report =
                tokio::task::spawn_blocking(move || controller::forecast_arima(&csv, &params, &ctx))
                    .await??;
            print_json(&report)
        }
    }
}
