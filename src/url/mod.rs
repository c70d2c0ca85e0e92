//! URL handling module for Product-Ripple
//!
//! This module provides URL normalization (frontier keys), link resolution
//! and the link acceptance filter.

mod filter;
mod normalize;

// Re-export main functions
pub use filter::{accept, LinkFilter, EXCLUDED_EXTENSIONS, PLATFORM_BLACKLIST};
pub use normalize::{normalize_url, origin_url, resolve_link};
