//! HTTP-boundary error type

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{services::StoreError, tasks::TimerClosed};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("No account for {0}")]
    UnknownAccount(String),

    #[error("duration cannot be 0")]
    EmptyDuration,

    #[error("Timer unavailable: {0}")]
    TimerUnavailable(#[from] TimerClosed),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::UnknownAccount(_) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::DuplicateEmail(_)) => StatusCode::CONFLICT,
            AppError::EmptyDuration
            | AppError::TimerUnavailable(_)
            | AppError::Store(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = match &self {
            AppError::Validation { field, message } => {
                let errors: BTreeMap<&str, &str> = [(*field, message.as_str())].into();
                json!({ "errors": errors })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
