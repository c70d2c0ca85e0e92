//! Crawl frontier
//!
//! Owns the `visited` and `pending` sets for one run. A URL is moved from
//! pending to visited at the moment it is dispatched, and never comes back.
//! Pending URLs are handed out in FIFO order.

use crate::state::UrlState;
use std::collections::{HashMap, HashSet, VecDeque};
use url::Url;

/// Visited/pending bookkeeping for one crawl
#[derive(Debug, Default)]
pub struct Frontier {
    /// Dispatched URLs and how far their processing got
    visited: HashMap<String, UrlState>,

    /// Membership of `queue`, for O(1) dedup
    pending: HashSet<String>,

    queue: VecDeque<Url>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL unless it is already pending or visited
    ///
    /// The fragment is dropped first, so `/a#x` and `/a#y` share one entry.
    /// Returns true if the URL was newly admitted.
    pub fn admit(&mut self, mut url: Url) -> bool {
        url.set_fragment(None);
        let key = url.as_str();

        if self.visited.contains_key(key) || self.pending.contains(key) {
            return false;
        }

        self.pending.insert(key.to_string());
        self.queue.push_back(url);
        true
    }

    /// Admits every URL and returns how many were new
    pub fn admit_all(&mut self, urls: impl IntoIterator<Item = Url>) -> usize {
        urls.into_iter().filter(|url| self.admit(url.clone())).count()
    }

    /// Takes up to `limit` pending URLs and marks them visited
    pub fn next_batch(&mut self, limit: usize) -> Vec<Url> {
        let mut batch = Vec::with_capacity(limit.min(self.queue.len()));

        while batch.len() < limit {
            let Some(url) = self.queue.pop_front() else {
                break;
            };

            self.pending.remove(url.as_str());
            self.visited.insert(url.as_str().to_string(), UrlState::Visited);
            batch.push(url);
        }

        batch
    }

    /// Records how a dispatched URL ended
    ///
    /// Returns false (and changes nothing) if the transition is not allowed,
    /// e.g. the URL was never dispatched or already completed.
    pub fn complete(&mut self, url: &Url, outcome: UrlState) -> bool {
        match self.visited.get_mut(url.as_str()) {
            Some(state) if state.can_transition_to(outcome) => {
                *state = outcome;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn state_of(&self, url: &Url) -> UrlState {
        let key = url.as_str();
        if let Some(state) = self.visited.get(key) {
            *state
        } else if self.pending.contains(key) {
            UrlState::Pending
        } else {
            UrlState::Unseen
        }
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is left to dispatch
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }
}
