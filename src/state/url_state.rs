//! URL state definitions for tracking crawl progress
//!
//! Every URL moves forward through these states and never back.

use std::fmt;

/// Represents the current state of a URL within one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// Never seen by the frontier
    Unseen,

    /// Admitted to the frontier and waiting for dispatch
    Pending,

    /// Dispatched; its fetch is in flight or failed
    Visited,

    // ===== Terminal States =====
    /// Page fetched and a product row was written
    ProductExtracted,

    /// Page fetched, only its links were used
    LinksOnly,
}

impl UrlState {
    /// Returns true if moving from `self` to `next` is allowed
    ///
    /// Transitions: Unseen → Pending → Visited → {ProductExtracted | LinksOnly}
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Unseen, Self::Pending)
                | (Self::Pending, Self::Visited)
                | (Self::Visited, Self::ProductExtracted)
                | (Self::Visited, Self::LinksOnly)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::Pending => "pending",
            Self::Visited => "visited",
            Self::ProductExtracted => "product_extracted",
            Self::LinksOnly => "links_only",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
