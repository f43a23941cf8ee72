//! HTTP mapping for `AppError`.
//!
//! `AppError` lives in the core crate, which knows nothing about axum, so a
//! local wrapper carries the `IntoResponse` impl.

use arca_core::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub recoverable: bool,
}

#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = err.error_code(), error = %err, "request failed");
        } else {
            tracing::debug!(code = err.error_code(), error = %err, "request rejected");
        }

        let body = ErrorResponse {
            error: err.client_message(),
            code: err.error_code(),
            recoverable: err.is_recoverable(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, HttpAppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = HttpAppError(AppError::NotFound("asset".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_maps_to_500() {
        let response = HttpAppError(AppError::Internal("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
