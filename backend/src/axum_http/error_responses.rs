use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crates::domain::errors::CoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::usecases::auth::AuthUseCaseError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Auth(#[from] AuthUseCaseError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Core(err) => core_status_and_message(err),
            AppError::Auth(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    error!(error = ?err, "http: auth request failed");
                    (status, "Internal server error".to_string())
                } else {
                    (status, err.to_string())
                }
            }
            AppError::Internal(err) => {
                error!(error = ?err, "http: request failed");
                internal()
            }
        }
    }
}

fn core_status_and_message(err: CoreError) -> (StatusCode, String) {
    match err {
        CoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        CoreError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        CoreError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        CoreError::Unverified => (StatusCode::BAD_REQUEST, err.to_string()),
        CoreError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        CoreError::Internal(inner) => {
            // Don't leak internal error detail to client
            error!(error = ?inner, "http: request failed");
            internal()
        }
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}
