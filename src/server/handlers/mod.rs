//! HTTP handlers for the server.
//!
//! Every handler answers with a JSON object carrying `success`. Failures
//! add `error` (human readable) and `code` (stable, from
//! [`TermicaError::code`]).

pub mod print;
pub mod queue;
pub mod status;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::TermicaError;

/// Handler result: JSON body on success, [`ApiError`] otherwise.
pub type ApiResult = Result<Json<Value>, ApiError>;

/// A printer error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TermicaError);

impl From<TermicaError> for ApiError {
    fn from(e: TermicaError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            TermicaError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            TermicaError::QueueFull { .. } => StatusCode::TOO_MANY_REQUESTS,
            TermicaError::PaperOut
            | TermicaError::InsufficientPaper { .. }
            | TermicaError::CoverOpen
            | TermicaError::PrinterOffline => StatusCode::CONFLICT,
            TermicaError::CommunicationError(_)
            | TermicaError::Transport(_)
            | TermicaError::Io(_) => StatusCode::BAD_GATEWAY,
            TermicaError::Config(_) | TermicaError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        let body = json!({
            "success": false,
            "error": self.0.to_string(),
            "code": self.0.code(),
        });
        (status, Json(body)).into_response()
    }
}

/// `{"success": true, "message": ...}`
pub(crate) fn done(message: impl Into<String>) -> ApiResult {
    Ok(Json(json!({ "success": true, "message": message.into() })))
}
