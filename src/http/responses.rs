//! Response bodies for the reload endpoint

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::pipeline::ErrorReporter;

/// Message carried in the body when the reload action fails. Kept as-is for
/// compatibility with existing clients.
pub const TRIGGER_FAILURE_MESSAGE: &str = "aa";

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// 500 response for a failed reload action.
///
/// If the body cannot be encoded the encoding error goes to the error
/// pipeline and the client gets the status line with an empty body.
pub fn trigger_failure(errors: &ErrorReporter) -> Response {
    match ErrorResponse::new(TRIGGER_FAILURE_MESSAGE).to_json() {
        Ok(body) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "application/json")],
            Body::from(body),
        )
            .into_response(),
        Err(e) => {
            errors.report(e.into());
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
