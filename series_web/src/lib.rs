//! # Series Web
//!
//! HTTP front-end over the `series_forecast` pipelines: file upload,
//! analysis, AR/ARIMA forecasts and the ARIMA order search, each answered
//! with a `{data, info, success}` JSON envelope.

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use crate::config::Settings;
pub use crate::routes::router;
pub use crate::state::AppState;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

/// Bind to `settings.bind` and serve until the process is stopped
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    settings
        .ensure_dirs()
        .context("failed to create data or static directory")?;

    let listener = TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    info!("listening on {}", listener.local_addr()?);

    let app = router(AppState::new(settings));
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
