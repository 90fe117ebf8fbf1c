use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::notifications::Notification;
use crate::services::rebuild::RebuildError;
use crate::services::registration::RegistrationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Import session not found: {0}")]
    SessionNotFound(u64),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Rebuild(#[from] RebuildError),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, notification) = match &self {
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Notification::error(self.to_string()))
            }
            AppError::SessionNotFound(_) => {
                (StatusCode::NOT_FOUND, Notification::error(self.to_string()))
            }
            AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, Notification::error(self.to_string()))
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, Notification::error(self.to_string())),
            AppError::Registration(RegistrationError::MissingName) => (
                StatusCode::BAD_REQUEST,
                Notification::error(self.to_string()),
            ),
            AppError::Registration(error) => (StatusCode::BAD_GATEWAY, Notification::from(error)),
            AppError::Rebuild(error) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Notification::from(error))
            }
            AppError::Upstream(_) => {
                (StatusCode::BAD_GATEWAY, Notification::error(self.to_string()))
            }
        };

        (status, Json(json!({ "notification": notification }))).into_response()
    }
}
