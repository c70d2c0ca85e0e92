//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: Tracks the lifecycle of individual URLs (unseen, pending, visited, processed)

mod url_state;

// Re-export main types
pub use url_state::UrlState;
