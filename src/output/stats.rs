//! Crawl statistics
//!
//! Summarizes a finished crawl from the final state of every claimed URL.

use crate::crawler::CrawlOutcome;
use crate::state::PageState;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Number of distinct URLs claimed against the budget
    pub pages_claimed: u64,

    /// Count of claimed pages by final state
    pub pages_by_state: HashMap<PageState, u64>,

    /// Total outgoing links across all recorded pages (duplicates included)
    pub total_links: u64,

    /// Total image URLs across all recorded pages
    pub total_images: u64,

    /// Whether the crawl stopped on its page budget
    pub budget_exhausted: bool,

    /// Wall-clock duration of the crawl in milliseconds
    pub duration_ms: i64,
}

impl CrawlStatistics {
    /// Computes statistics for a finished crawl
    pub fn from_outcome(outcome: &CrawlOutcome) -> Self {
        let mut pages_by_state = HashMap::new();
        for state in outcome.visited.values() {
            *pages_by_state.entry(*state).or_insert(0) += 1;
        }

        Self {
            pages_claimed: outcome.visited.len() as u64,
            pages_by_state,
            total_links: outcome
                .pages
                .values()
                .map(|p| p.outgoing_links.len() as u64)
                .sum(),
            total_images: outcome
                .pages
                .values()
                .map(|p| p.image_urls.len() as u64)
                .sum(),
            budget_exhausted: outcome.budget_exhausted,
            duration_ms: (outcome.finished_at - outcome.started_at).num_milliseconds(),
        }
    }

    /// Number of claimed pages that ended in `state`
    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages claimed: {}", stats.pages_claimed);
    println!("  Outgoing links found: {}", stats.total_links);
    println!("  Images found: {}", stats.total_images);
    println!(
        "  Duration: {:.2}s",
        stats.duration_ms as f64 / 1000.0
    );
    if stats.budget_exhausted {
        println!("  Stopped early: page budget reached");
    }
    println!();

    println!("Pages by State:");
    for state in PageState::all_states() {
        let count = stats.count(state);
        if count == 0 {
            continue;
        }
        let percentage = if stats.pages_claimed > 0 {
            (count as f64 / stats.pages_claimed as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
}
