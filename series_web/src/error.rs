//! Response envelope and the HTTP error mapping

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use series_forecast::ForecastError;
use thiserror::Error;
use tracing::{debug, error, warn};

pub const INFO_SUCCESS: &str = "SUCCESS!";
pub const INFO_BAD_REQUEST: &str = "ERROR - BAD REQUEST!";
pub const INFO_NOT_FOUND: &str = "ERROR - REQUEST NOT FOUND!";
pub const INFO_METHOD_NOT_ALLOWED: &str = "ERROR - METHOD NOT ALLOWED!";
pub const INFO_INTERNAL_ERROR: &str = "ERROR - INTERNAL SERVER ERROR!";

/// Body of every JSON response
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub info: &'static str,
    pub success: bool,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            data: Some(data),
            info: INFO_SUCCESS,
            success: true,
        })
    }
}

impl Envelope<()> {
    fn failure(info: &'static str) -> Json<Self> {
        Json(Self {
            data: None,
            info,
            success: false,
        })
    }
}

/// Failure of a request handler
///
/// Details are logged; clients only ever see the generic envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn info(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => INFO_BAD_REQUEST,
            ApiError::NotFound(_) => INFO_NOT_FOUND,
            ApiError::MethodNotAllowed => INFO_METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => INFO_INTERNAL_ERROR,
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(_) => error!(error = %self, "request failed"),
            ApiError::BadRequest(_) => warn!(error = %self, "request rejected"),
            ApiError::NotFound(_) | ApiError::MethodNotAllowed => debug!(error = %self, "no such route"),
        }
        (self.status(), Envelope::failure(self.info())).into_response()
    }
}
