use crate::crawler::PageRecord;
use crate::state::PageState;
use std::collections::{BTreeMap, HashMap};

/// Result of trying to claim a normalized URL against the page budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The crawl has already been stopped; nothing was claimed
    Stopped,

    /// Another branch claimed this URL first
    AlreadyVisited,

    /// The budget was full. Returned to exactly one caller, which must cancel the crawl
    BudgetExhausted,

    /// The URL is now reserved for the caller to fetch
    Claimed,
}

/// Mutable state shared by every branch of one crawl
///
/// Invariants:
/// - `visited.len() <= max_pages` for the budget passed to every `try_claim`
/// - once `stopped` is set it is never cleared
/// - every key of `pages` is also a key of `visited`
///
/// The state has no interior locking. The crawler keeps it behind a mutex and calls
/// `try_claim` with the guard held, which makes check-then-claim atomic.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: HashMap<String, PageState>,
    pages: BTreeMap<String, PageRecord>,
    stopped: bool,
}

impl CrawlState {
    /// Creates an empty state for a fresh crawl
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `normalized` unless the crawl is stopped, the URL is already known, or the
    /// budget is exhausted
    ///
    /// The first caller to find the budget full flips `stopped` and gets
    /// `BudgetExhausted`; everyone after that gets `Stopped`.
    pub fn try_claim(&mut self, normalized: &str, max_pages: usize) -> ClaimOutcome {
        if self.stopped {
            return ClaimOutcome::Stopped;
        }

        if self.visited.contains_key(normalized) {
            return ClaimOutcome::AlreadyVisited;
        }

        if self.visited.len() >= max_pages {
            self.stopped = true;
            return ClaimOutcome::BudgetExhausted;
        }

        self.visited.insert(normalized.to_string(), PageState::Claimed);
        ClaimOutcome::Claimed
    }

    /// Moves a claimed URL to a terminal state
    ///
    /// Returns false (and changes nothing) if the URL was never claimed or has already
    /// settled.
    pub fn finish(&mut self, normalized: &str, next: PageState) -> bool {
        match self.visited.get_mut(normalized) {
            Some(state) if state.can_transition_to(next) => {
                *state = next;
                true
            }
            _ => false,
        }
    }

    /// Stores the record for a claimed URL and marks it `Recorded`
    ///
    /// A record is stored at most once per URL. Returns false if the URL was not in the
    /// `Claimed` state.
    pub fn record(&mut self, normalized: &str, record: PageRecord) -> bool {
        if !self.finish(normalized, PageState::Recorded) {
            return false;
        }
        self.pages.insert(normalized.to_string(), record);
        true
    }

    /// Returns true once the page budget has been exhausted
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of URLs claimed so far (the budget consumption)
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of page records stored so far
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the state of a normalized URL, if it was ever claimed
    pub fn state_of(&self, normalized: &str) -> Option<PageState> {
        self.visited.get(normalized).copied()
    }

    /// Consumes the state, returning the result map and the per-URL states
    pub fn into_parts(self) -> (BTreeMap<String, PageRecord>, HashMap<String, PageState>) {
        (self.pages, self.visited)
    }
}
