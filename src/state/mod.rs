//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Tracks the state of each claimed page (claimed, recorded, skipped)
//! - `CrawlState`: The visited set, result map and stop flag shared by every branch of one crawl

mod crawl_state;
mod page_state;

// Re-export main types
pub use crawl_state::{ClaimOutcome, CrawlState};
pub use page_state::PageState;
