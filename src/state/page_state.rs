//! Page state definitions for tracking crawl progress
//!
//! Every distinct normalized URL the crawler claims moves through these states. A URL that
//! is never claimed (cross-domain, duplicate, over budget) never gets a state at all.

use std::fmt;

/// Represents the current state of a claimed page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Page has been claimed against the page budget and is being fetched
    Claimed,

    /// Page was fetched as HTML and a record was stored
    Recorded,

    /// Page answered with an error status, a non-HTML content type, or an empty body
    SkippedNotHtml,

    /// Fetch failed at the transport level or was cancelled
    SkippedFetchFailed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Claimed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Recorded)
    }

    /// Returns true if the page was claimed but produced no record
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedNotHtml | Self::SkippedFetchFailed)
    }

    /// Returns the string form used in logs and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claimed => "claimed",
            Self::Recorded => "recorded",
            Self::SkippedNotHtml => "skipped_not_html",
            Self::SkippedFetchFailed => "skipped_fetch_failed",
        }
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Only `Claimed` may move on, and only to a terminal state.
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(self, Self::Claimed) && next.is_terminal()
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Claimed,
            Self::Recorded,
            Self::SkippedNotHtml,
            Self::SkippedFetchFailed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
