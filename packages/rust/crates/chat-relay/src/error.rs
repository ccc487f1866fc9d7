//! Gateway error type.
//!
//! Handlers return `Result<T, RelayError>`; the [`IntoResponse`] impl maps each
//! variant to a status code and a JSON `{"error": ...}` body. Store and upstream
//! failures are logged in full but reach the caller only as a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::observability::SessionEvent;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed or incomplete request body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Session store or completion API failure.
    #[error("relay failure: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = match self {
            Self::BadRequest(message) => message,
            Self::Internal(error) => {
                tracing::error!(
                    event = SessionEvent::RelayTurnFailed.as_str(),
                    error = ?error,
                    "relay request failed"
                );
                "internal server error".to_string()
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
