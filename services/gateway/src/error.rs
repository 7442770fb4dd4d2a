use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::service::ServiceError;

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(epoch) => AppError::NotFound(format!("no sample at epoch {epoch}")),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::StoreError;

    #[test]
    fn test_service_error_mapping() {
        let not_found: AppError = ServiceError::NotFound("2024-079T12:00:00.000Z".into()).into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let empty: AppError = ServiceError::EmptyDataset.into();
        assert_eq!(empty.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let down: AppError = ServiceError::Store(StoreError::Unavailable("redis: refused".into())).into();
        assert_eq!(down.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_request_status() {
        let resp = AppError::BadRequest("offset must not be negative".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
