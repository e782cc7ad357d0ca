//! API Error Handling
//!
//! Unified error type and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::{DispatchError, StatusError};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidInput(msg) => ApiError::BadRequest(msg),
            DispatchError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<StatusError> for ApiError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_status_codes() {
        let id = Uuid::new_v4();
        let cases = [
            (
                ApiError::from(DispatchError::InvalidInput("bad".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(DispatchError::NotFound(id)),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(DispatchError::DuplicateId(id)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(StatusError::NotFound(id)),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
