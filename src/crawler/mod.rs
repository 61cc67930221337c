//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind a bounded-concurrency gate
//! - HTML parsing into page records
//! - Recursive, deduplicated crawl coordination with a page budget

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{
    crawl, crawl_with_config, CrawlOptions, CrawlOutcome, Crawler, DEFAULT_MAX_PAGES,
};
pub use fetcher::{build_http_client, FetchGate, DEFAULT_MAX_CONCURRENCY};
pub use parser::{
    extract_page, first_paragraph_from_html, heading_from_html, images_from_html,
    urls_from_html, PageRecord,
};
