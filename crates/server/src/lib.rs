//! Support Agent Server
//!
//! HTTP endpoints for the query orchestration core.

pub mod assembler;
pub mod http;
pub mod metrics;
pub mod state;

pub use assembler::{QueryResponse, ResponseAssembler, ServiceCard};
pub use http::create_router;
pub use metrics::{init_metrics, record_cache_hit, record_request};
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request field {field}: {message}")]
    InvalidRequest {
        field: &'static str,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<&ServerError> for axum::http::StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidRequest { .. } => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from(&self);
        let body = match &self {
            ServerError::InvalidRequest { field, message } => serde_json::json!({
                "success": false,
                "error": { "field": field, "message": message },
            }),
            ServerError::Internal(message) => serde_json::json!({
                "success": false,
                "error": { "message": message },
            }),
        };
        (status, axum::Json(body)).into_response()
    }
}
