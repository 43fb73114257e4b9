//! Request-level errors.
//!
//! Handlers return `Result<T, AppError>`; the error renders as a JSON body
//! `{"error": "..."}` with a matching status code. Failures that happen after
//! a response stream has started are reported in-band instead (see
//! [`crate::chat::events::StreamEvent::Error`]).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    /// A store operation failed; `context` names what was being attempted.
    #[error("{context}: {source}")]
    Database {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl AppError {
    pub fn room_not_found() -> Self {
        AppError::NotFound("Chat room not found".to_string())
    }

    pub fn database(context: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| AppError::Database { context, source }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
