//! API server

use super::handlers::{create_router, AppState};
use super::ApiError;
use crate::config::Config;
use axum::body::Body;
use axum::http::Response;
use axum::Router;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::Span;

/// HTTP server exposing the crawl API
pub struct ApiServer {
    addr: String,
    state: AppState,
}

impl ApiServer {
    /// Creates a server bound to `[server] host:port` from `config`
    pub fn new(config: Config) -> Self {
        let addr = format!("{}:{}", config.server.host, config.server.port);
        Self {
            addr,
            state: AppState::new(config),
        }
    }

    /// Address the server listens on
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        create_router(self.state.clone()).layer(TraceLayer::new_for_http().on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                let status = response.status();
                if status.as_u16() >= 300 {
                    tracing::warn!("Responded {} in {:?}", status, latency);
                } else {
                    tracing::info!("Responded {} in {:?}", status, latency);
                }
            },
        ))
    }

    /// Serves until Ctrl-C
    pub async fn start(&self) -> Result<(), ApiError> {
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| ApiError::Bind {
                addr: self.addr.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!("API server listening on {}", self.addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Serve(e.to_string()))?;

        tracing::info!("API server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
