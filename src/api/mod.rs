//! HTTP API for on-demand crawls
//!
//! # Endpoints
//!
//! - `GET /api/health`: liveness check
//! - `GET /api/crawl?url=<absolute url>&maxPages=<n>[&format=pages|graph]`: runs one crawl
//!   and returns the page map, or its node/edge graph
//!
//! Only request validation failures surface as client errors. Pages that fail during a
//! crawl are simply missing from the result.

mod handlers;
mod server;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub use handlers::{create_router, AppState, CrawlQuery, ResultFormat};
pub use server::ApiServer;

/// Errors raised by the API layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required query parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("maxPages must be a positive integer, got '{0}'")]
    InvalidMaxPages(String),

    #[error("Unknown format '{0}', expected 'pages' or 'graph'")]
    InvalidFormat(String),

    #[error("Crawl failed: {0}")]
    Crawl(String),

    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Server error: {0}")]
    Serve(String),
}

impl ApiError {
    /// HTTP status returned for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_)
            | Self::InvalidUrl(_)
            | Self::InvalidMaxPages(_)
            | Self::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Self::Crawl(_) | Self::Bind { .. } | Self::Serve(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
