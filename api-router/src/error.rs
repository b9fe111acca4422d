use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("{error}: {details}")]
    InternalError { error: String, details: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ApiError {
    /// Maps an internal failure, labelling server errors with `error`.
    pub fn from_app(err: AppError, error: &str) -> Self {
        match err {
            AppError::Validation(msg) => Self::ValidationError(msg),
            other => {
                tracing::error!(details = %other, "{error}");
                Self::InternalError {
                    error: error.to_string(),
                    details: other.to_string(),
                }
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::from_app(err, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InternalError { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InternalErrorResponse { error, details }),
            )
                .into_response(),
            Self::ValidationError(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
        }
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize, Debug)]
struct InternalErrorResponse {
    error: String,
    details: String,
}
