//! HTTP mapping of gateway errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::domain::Error;

/// Wraps a domain error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client errors echo the validation message; server errors keep the
    /// detail in the logs.
    fn message(&self) -> String {
        match &self.0 {
            Error::InvalidRequest(msg) => msg.clone(),
            Error::ScoringUnavailable(_) => {
                "Risk scoring is currently unavailable.".to_string()
            }
            _ => "Internal server error.".to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = Json(json!({
            "status": "error",
            "message": self.message(),
        }));

        (status, body).into_response()
    }
}
