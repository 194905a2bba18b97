//! HTTP routes and their handlers
//!
//! Pipelines run on the blocking pool; every JSON answer is wrapped in an
//! [`Envelope`].

use crate::error::{ApiError, Envelope};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use series_forecast::controller::{
    self, AnalysisReport, ArReport, ArimaReport, ParameterSearchReport,
};
use series_forecast::{FileManager, ForecastParameters};
use std::collections::HashMap;
use tracing::info;

const UPLOAD_FIELD: &str = "file";
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>timescope</title>
</head>
<body>
  <h1>Time series analysis</h1>
  <p>Upload a CSV file with <code>date</code> and <code>value</code> columns.</p>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".csv">
    <button type="submit">Upload</button>
  </form>
</body>
</html>
"#;

/// Body naming a previously uploaded file
#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub file_name: String,
}

/// Body naming a file plus loosely typed forecast parameters
#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub file_name: String,
    #[serde(flatten)]
    pub parameters: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub file_name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/upload", post(upload))
        .route("/analysis", post(analysis))
        .route("/ar", post(forecast_ar))
        .route("/arima", post(forecast_arima))
        .route("/arima/test-params", post(forecast_arima_test_params))
        .route("/static/{file}", get(static_file))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::map_response(method_not_allowed))
        .with_state(state)
}

async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("no route".to_string())
}

/// Replace the router's empty 405 with the JSON envelope
async fn method_not_allowed(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        ApiError::MethodNotAllowed.into_response()
    } else {
        response
    }
}

/// Run a pipeline on the blocking pool
async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> series_forecast::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| ApiError::Internal(format!("pipeline task failed: {err}")))?
        .map_err(ApiError::from)
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope<UploadReport>>, ApiError> {
    let mut multipart = multipart?;

    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("upload has no file name".to_string()))?;
        upload = Some((file_name, field.bytes().await?));
        break;
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest(format!("missing '{UPLOAD_FIELD}' field")))?;

    let data_dir = state.data_dir().to_path_buf();
    let stored =
        run_blocking(move || FileManager::store_upload(&data_dir, &file_name, &bytes)).await?;
    let file_name = stored
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Internal("stored upload has no file name".to_string()))?;

    info!(file = %file_name, "file uploaded successfully!");
    Ok(Envelope::success(UploadReport { file_name }))
}

async fn analysis(
    State(state): State<AppState>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<Envelope<AnalysisReport>>, ApiError> {
    let Json(request) = payload?;
    let path = FileManager::resolve(state.data_dir(), &request.file_name)?;
    let ctx = state.analysis_context();

    let report = run_blocking(move || controller::analysis(&path, &ctx)).await?;
    Ok(Envelope::success(report))
}

async fn forecast_ar(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<Envelope<ArReport>>, ApiError> {
    let Json(request) = payload?;
    let path = FileManager::resolve(state.data_dir(), &request.file_name)?;
    let params = ForecastParameters::from_map(&request.parameters)?;
    let ctx = state.analysis_context();

    let report = run_blocking(move || controller::forecast_ar(&path, &params, &ctx)).await?;
    Ok(Envelope::success(report))
}

async fn forecast_arima(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<Envelope<ArimaReport>>, ApiError> {
    let Json(request) = payload?;
    let path = FileManager::resolve(state.data_dir(), &request.file_name)?;
    let params = ForecastParameters::from_map(&request.parameters)?;
    let ctx = state.analysis_context();

    let report = run_blocking(move || controller::forecast_arima(&path, &params, &ctx)).await?;
    Ok(Envelope::success(report))
}

async fn forecast_arima_test_params(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<Envelope<ParameterSearchReport>>, ApiError> {
    let Json(request) = payload?;
    let path = FileManager::resolve(state.data_dir(), &request.file_name)?;
    let params = ForecastParameters::from_map(&request.parameters)?;
    let ctx = state.analysis_context();

    let report =
        run_blocking(move || controller::forecast_arima_test_params(&path, &params, &ctx)).await?;
    Ok(Envelope::success(report))
}

async fn static_file(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let path = FileManager::resolve(state.static_dir(), &file)
        .map_err(|err| ApiError::NotFound(err.to_string()))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|err| ApiError::NotFound(err.to_string()))?;

    let content_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
