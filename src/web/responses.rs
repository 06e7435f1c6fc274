use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::session::SessionState;

/// Errors that reach the client as an HTTP status. Per-product failures never
/// do; they travel inside the results list.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match self {
            ApiError::BadRequest(msg) => msg,
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub session: SessionState,
    pub version: String,
    pub uptime_secs: u64,
    /// Minimum score a card needs to count as a match.
    pub confidence_threshold: u8,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthResponse {
    pub fn from_session(session: SessionState, uptime_secs: u64, confidence_threshold: u8) -> Self {
        let status = if session.is_usable() { "healthy" } else { "degraded" };
        Self {
            status: status.to_string(),
            session,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs,
            confidence_threshold,
            timestamp: chrono::Utc::now(),
        }
    }
}
