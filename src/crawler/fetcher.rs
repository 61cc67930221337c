//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the identifying user agent
//! - Bounding concurrent requests with a shared pool of permits
//! - Racing every request against the crawl's cancellation token
//! - Filtering out error statuses and non-HTML responses

use crate::config::UserAgentConfig;
use crate::url::same_host;
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Default number of requests allowed in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Maximum number of same-host redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed only while they stay on the host of the original request.
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total timeout applied to every request
///
/// # Example
///
/// ```no_run
/// use bald_stalker::config::UserAgentConfig;
/// use bald_stalker::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(same_host_redirects())
        .gzip(true)
        .brotli(true)
        .build()
}

fn same_host_redirects() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }

        let stays_on_host = attempt
            .previous()
            .first()
            .map(|origin| same_host(origin, attempt.url()))
            .unwrap_or(false);

        if stays_on_host {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

/// Bounded-concurrency HTTP GET
///
/// A gate owns a fixed pool of permits. Every fetch holds one permit from before the
/// request is sent until the body has been read, the request failed, or the fetch was
/// cancelled.
#[derive(Debug, Clone)]
pub struct FetchGate {
    client: Client,
    permits: Arc<Semaphore>,
    max_concurrency: usize,
}

impl FetchGate {
    /// Creates a gate allowing `max_concurrency` requests in flight (at least one)
    pub fn new(client: Client, max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    /// Maximum number of requests this gate lets through at once
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Number of permits not currently held by a fetch
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Fetches a page's HTML
    ///
    /// # Returns
    ///
    /// * `Ok(Some(body))` - The response was HTML with a status below 400
    /// * `Ok(None)` - Status >= 400, an unfollowed redirect, or a non-HTML content type
    /// * `Err(FetchError::Cancelled)` - `cancel` fired before or during the request
    /// * `Err(FetchError)` - The transport failed (DNS, connection, timeout, body read)
    pub async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, FetchError> {
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(url)),
            permit = self.permits.acquire() => permit.map_err(|_| cancelled(url))?,
        };

        tracing::debug!("Fetching {}", url);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(url)),
            result = self.client.get(url).send() => result.map_err(|e| classify_error(url, e))?,
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            tracing::warn!("Request failed for {}: HTTP {}", url, status);
            return Ok(None);
        }

        if status.is_redirection() {
            tracing::debug!("Not following redirect from {} to another host", url);
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            tracing::warn!("Response from {} is not HTML: {:?}", url, content_type);
            return Ok(None);
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(url)),
            result = response.text() => result.map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?,
        };

        Ok(Some(body))
    }
}

fn cancelled(url: &str) -> FetchError {
    FetchError::Cancelled {
        url: url.to_string(),
    }
}

fn classify_error(url: &str, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_gate(max_concurrency: usize) -> FetchGate {
        let client =
            build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap();
        FetchGate::new(client, max_concurrency)
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let gate = test_gate(0);
        assert_eq!(gate.max_concurrency(), 1);
        assert_eq!(gate.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_fetch_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", "BaldStalker/1.0"))
            .respond_with(html("<h1>Hello</h1>"))
            .expect(1)
            .mount(&server)
            .await;

        let gate = test_gate(2);
        let body = gate
            .fetch(&format!("{}/", server.uri()), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(body.as_deref(), Some("<h1>Hello</h1>"));
        assert_eq!(gate.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_error_status_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_raw("<h1>Not found</h1>", "text/html"))
            .mount(&server)
            .await;

        let gate = test_gate(1);
        let body = gate
            .fetch(&format!("{}/missing", server.uri()), &CancellationToken::new())
            .await
            .unwrap();

        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_non_html_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0x89, 0x50, 0x4e, 0x47], "image/png"),
            )
            .mount(&server)
            .await;

        let gate = test_gate(1);
        let body = gate
            .fetch(&format!("{}/logo.png", server.uri()), &CancellationToken::new())
            .await
            .unwrap();

        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_cross_host_redirect_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/away"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "http://example.invalid/"),
            )
            .mount(&server)
            .await;

        let gate = test_gate(1);
        let body = gate
            .fetch(&format!("{}/away", server.uri()), &CancellationToken::new())
            .await
            .unwrap();

        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_same_host_redirect_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(html("<p>moved</p>"))
            .mount(&server)
            .await;

        let gate = test_gate(1);
        let body = gate
            .fetch(&format!("{}/old", server.uri()), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(body.as_deref(), Some("<p>moved</p>"));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let gate = test_gate(1);
        let result = gate
            .fetch("http://127.0.0.1:1/", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(FetchError::Transport { .. })));
        assert_eq!(gate.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html("<p>never</p>"))
            .expect(0)
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let gate = test_gate(1);
        let result = gate.fetch(&format!("{}/", server.uri()), &cancel).await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(gate.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_cancel_mid_request_releases_permit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let gate = test_gate(1);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = gate.fetch(&format!("{}/", server.uri()), &cancel).await;

        assert!(result.unwrap_err().is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(gate.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html("<p>slow</p>").set_delay(Duration::from_millis(200)))
            .mount(&server)
            .await;

        let gate = test_gate(2);
        let cancel = CancellationToken::new();
        let url = format!("{}/", server.uri());

        let start = Instant::now();
        let results = tokio::join!(
            gate.fetch(&url, &cancel),
            gate.fetch(&url, &cancel),
            gate.fetch(&url, &cancel),
            gate.fetch(&url, &cancel),
            gate.fetch(&url, &cancel),
            gate.fetch(&url, &cancel),
        );
        let elapsed = start.elapsed();

        for result in [results.0, results.1, results.2, results.3, results.4, results.5] {
            assert!(result.unwrap().is_some());
        }
        // Six 200ms requests through two permits need at least three rounds
        assert!(elapsed >= Duration::from_millis(550), "elapsed {:?}", elapsed);
        assert_eq!(gate.available_permits(), 2);
    }
}
