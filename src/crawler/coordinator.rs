//! Crawler coordinator - main crawl orchestration logic
//!
//! A crawl is a tree of concurrently spawned visits. Each visit:
//! 1. Drops candidates on another host
//! 2. Claims the candidate's normalized URL against the page budget
//! 3. Fetches the page through the shared fetch gate
//! 4. Records the extracted page
//! 5. Spawns a visit for every outgoing link
//!
//! The first visit to find the budget full stops the crawl and cancels every fetch that
//! is still waiting or in flight. The crawl returns once every spawned visit has settled.

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::fetcher::{build_http_client, FetchGate, DEFAULT_MAX_CONCURRENCY};
use crate::crawler::parser::{extract_page, PageRecord};
use crate::state::{ClaimOutcome, CrawlState, PageState};
use crate::url::{extract_host, normalize_url, same_host};
use crate::{CrawlerError, UrlError};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use url::Url;

/// Default page budget for one crawl
pub const DEFAULT_MAX_PAGES: usize = 100;

type VisitFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Limits applied to one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of fetches in flight
    pub max_concurrency: usize,

    /// Maximum number of distinct pages claimed
    pub max_pages: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl From<&CrawlerConfig> for CrawlOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency as usize,
            max_pages: config.max_pages as usize,
        }
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// One record per normalized URL that was fetched as HTML
    pub pages: BTreeMap<String, PageRecord>,

    /// Final state of every claimed normalized URL
    pub visited: HashMap<String, PageState>,

    /// True if the crawl stopped because the page budget ran out
    pub budget_exhausted: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A single crawl run
///
/// The state lives for exactly one `run`; a new crawl needs a new `Crawler`.
pub struct Crawler {
    context: Arc<CrawlContext>,
}

struct CrawlContext {
    base_url: Url,
    seed: String,
    max_pages: usize,
    gate: FetchGate,
    state: Mutex<CrawlState>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl Crawler {
    /// Creates a crawler rooted at `base_url`
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(CrawlerError::UrlError)` - `base_url` is not an absolute URL with a host
    pub fn new(
        base_url: &str,
        options: CrawlOptions,
        client: Client,
    ) -> Result<Self, CrawlerError> {
        let parsed =
            Url::parse(base_url).map_err(|e| UrlError::Parse(format!("{}: {}", base_url, e)))?;
        if extract_host(&parsed).is_none() {
            return Err(UrlError::MissingDomain(base_url.to_string()).into());
        }

        Ok(Self {
            context: Arc::new(CrawlContext {
                base_url: parsed,
                seed: base_url.to_string(),
                max_pages: options.max_pages,
                gate: FetchGate::new(client, options.max_concurrency),
                state: Mutex::new(CrawlState::new()),
                cancel: CancellationToken::new(),
                tasks: TaskTracker::new(),
            }),
        })
    }

    /// Runs the crawl to completion
    ///
    /// Returns only after every spawned visit (including cancelled ones and visits
    /// spawned by visits) has settled. A visit that panics is logged by the runtime and
    /// otherwise ignored.
    pub async fn run(self) -> CrawlOutcome {
        let started_at = Utc::now();
        let context = &self.context;

        tracing::info!(
            "Starting crawl at {} (max {} pages, {} concurrent fetches)",
            context.seed,
            context.max_pages,
            context.gate.max_concurrency()
        );

        context
            .tasks
            .spawn(Arc::clone(context).visit(context.seed.clone()));
        context.tasks.close();
        context.tasks.wait().await;

        let state = std::mem::take(&mut *context.lock_state());
        let budget_exhausted = state.is_stopped();
        let (pages, visited) = state.into_parts();

        tracing::info!(
            "Crawl finished: {} pages claimed, {} recorded",
            visited.len(),
            pages.len()
        );

        CrawlOutcome {
            pages,
            visited,
            budget_exhausted,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

impl CrawlContext {
    fn lock_state(&self) -> MutexGuard<'_, CrawlState> {
        // Nothing panics while holding the lock, but a poisoned state is still consistent
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn visit(self: Arc<Self>, url: String) -> VisitFuture {
        Box::pin(async move {
            if self.cancel.is_cancelled() {
                return;
            }

            let candidate = match Url::parse(&url) {
                Ok(candidate) => candidate,
                Err(e) => {
                    tracing::debug!("Skipping unparsable link {}: {}", url, e);
                    return;
                }
            };

            if !same_host(&self.base_url, &candidate) {
                tracing::trace!("Skipping cross-domain link {}", url);
                return;
            }

            let normalized = match normalize_url(&url) {
                Ok(normalized) => normalized,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", url, e);
                    return;
                }
            };

            let claim = self.lock_state().try_claim(&normalized, self.max_pages);
            match claim {
                ClaimOutcome::Claimed => {}
                ClaimOutcome::BudgetExhausted => {
                    tracing::info!(
                        "Reached maximum number of pages to crawl ({})",
                        self.max_pages
                    );
                    self.cancel.cancel();
                    return;
                }
                ClaimOutcome::AlreadyVisited | ClaimOutcome::Stopped => return,
            }

            tracing::info!("Crawling {}", url);

            let record = match self.gate.fetch(&url, &self.cancel).await {
                Ok(Some(html)) if !html.is_empty() => extract_page(&html, &url),
                Ok(_) => {
                    self.lock_state().finish(&normalized, PageState::SkippedNotHtml);
                    return;
                }
                Err(e) => {
                    if e.is_cancelled() {
                        tracing::debug!("{}", e);
                    } else {
                        tracing::warn!("{}", e);
                    }
                    self.lock_state().finish(&normalized, PageState::SkippedFetchFailed);
                    return;
                }
            };

            let links = record.outgoing_links.clone();
            let stopped = {
                let mut state = self.lock_state();
                state.record(&normalized, record);
                state.is_stopped()
            };

            if stopped {
                return;
            }

            for link in links {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.tasks.spawn(Arc::clone(&self).visit(link));
            }
        })
    }
}

/// Crawls a site with the default client and returns one record per normalized URL
///
/// # Arguments
///
/// * `base_url` - Seed URL; only links on its host are followed
/// * `max_concurrency` - Maximum number of fetches in flight
/// * `max_pages` - Maximum number of distinct pages claimed
///
/// # Returns
///
/// * `Ok(pages)` - Possibly fewer than `max_pages` entries; per-page failures are logged
/// * `Err(CrawlerError)` - `base_url` is invalid or the HTTP client could not be built
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), bald_stalker::CrawlerError> {
/// let pages = bald_stalker::crawl("https://blog.boot.dev", 5, 25).await?;
/// for (normalized, page) in &pages {
///     println!("{} -> {}", normalized, page.heading);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    base_url: &str,
    max_concurrency: usize,
    max_pages: usize,
) -> Result<BTreeMap<String, PageRecord>, CrawlerError> {
    let defaults = CrawlerConfig::default();
    let client = build_http_client(
        &UserAgentConfig::default(),
        Duration::from_secs(defaults.request_timeout_secs),
    )?;

    let options = CrawlOptions {
        max_concurrency,
        max_pages,
    };
    let crawler = Crawler::new(base_url, options, client)?;
    Ok(crawler.run().await.pages)
}

/// Crawls a site using the limits and user agent from `config`
pub async fn crawl_with_config(
    base_url: &str,
    config: &Config,
) -> Result<CrawlOutcome, CrawlerError> {
    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )?;

    let crawler = Crawler::new(base_url, CrawlOptions::from(&config.crawler), client)?;
    Ok(crawler.run().await)
}
