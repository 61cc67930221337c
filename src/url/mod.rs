//! URL handling module
//!
//! This module provides URL normalization (the page identity used for deduplication)
//! and the host comparison that keeps a crawl on its seed domain.

mod domain;
mod normalize;

pub use domain::{extract_host, same_host};
pub use normalize::normalize_url;
