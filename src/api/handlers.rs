//! Routes and request handlers

use super::ApiError;
use crate::config::Config;
use crate::crawler::crawl_with_config;
use crate::output::build_graph;
use crate::url::extract_host;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Limits and user agent used for every crawl
    pub config: Arc<Config>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}

/// Raw query of `GET /api/crawl`
///
/// Every field is optional here so that a missing or malformed value produces our own
/// JSON error instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CrawlQuery {
    pub url: Option<String>,
    #[serde(rename = "maxPages")]
    pub max_pages: Option<String>,
    pub format: Option<String>,
}

/// Shape of a successful crawl response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    /// Normalized URL to page record
    #[default]
    Pages,

    /// Nodes and links
    Graph,
}

#[derive(Debug)]
struct CrawlRequest {
    url: String,
    max_pages: u32,
    format: ResultFormat,
}

impl CrawlQuery {
    fn validate(self) -> Result<CrawlRequest, ApiError> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ApiError::MissingParameter("url"))?;
        let parsed = Url::parse(&url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))?;
        if extract_host(&parsed).is_none() {
            return Err(ApiError::InvalidUrl(format!("{}: no host", url)));
        }

        let raw_max = self
            .max_pages
            .ok_or(ApiError::MissingParameter("maxPages"))?;
        let max_pages = match raw_max.trim().parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => return Err(ApiError::InvalidMaxPages(raw_max)),
        };

        let format = match self.format.as_deref() {
            None | Some("pages") => ResultFormat::Pages,
            Some("graph") => ResultFormat::Graph,
            Some(other) => return Err(ApiError::InvalidFormat(other.to_string())),
        };

        Ok(CrawlRequest {
            url,
            max_pages,
            format,
        })
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    success: bool,
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/crawl", get(crawl_site))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn crawl_site(
    State(state): State<AppState>,
    Query(query): Query<CrawlQuery>,
) -> Result<Response, ApiError> {
    let request = query.validate()?;

    let mut config = Config::clone(&state.config);
    config.crawler.max_pages = request.max_pages;

    tracing::info!(
        "API crawl of {} (max {} pages)",
        request.url,
        request.max_pages
    );

    let outcome = crawl_with_config(&request.url, &config)
        .await
        .map_err(|e| ApiError::Crawl(e.to_string()))?;

    let response = match request.format {
        ResultFormat::Pages => Json(outcome.pages).into_response(),
        ResultFormat::Graph => Json(build_graph(&outcome.pages)).into_response(),
    };
    Ok(response)
}
