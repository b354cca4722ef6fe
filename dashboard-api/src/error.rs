//! Mapping dashboard errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dashboard_core::DashboardError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error carrying a `DashboardError`
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub DashboardError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DashboardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Transport(_)
            | DashboardError::ExchangeApi { .. }
            | DashboardError::Parse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::Exchange;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(DashboardError::not_found("View")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(DashboardError::invalid_request("bad limit")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(DashboardError::exchange_api(Exchange::Bybit, 10001, "bad symbol")).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
