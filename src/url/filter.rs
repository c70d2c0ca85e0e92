//! Link acceptance rules
//!
//! Decides which discovered links may enter the frontier: scope host, the
//! fixed platform blacklist, the user blacklist and excluded file types.

use url::Url;

/// Substrings that mark non-content destinations (social platforms, contact schemes)
pub const PLATFORM_BLACKLIST: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "linkedin.com",
    "youtube.com",
    "pinterest.com",
    "mailto",
    "tel",
];

/// Path suffixes of documents that are never HTML
pub const EXCLUDED_EXTENSIONS: &[&str] = &[".pdf", ".PDF", ".jpg", ".png", ".zip", ".docx"];

/// Decides which discovered links may enter the frontier
///
/// All checks are plain substring tests: `/en` in the blacklist also rejects
/// `/energy`, and a scope of `shop.com` also admits `myshop.com`.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    scope_domain: String,
    user_blacklist: Vec<String>,
}

impl LinkFilter {
    /// Creates a filter scoped to `scope_domain`; empty blacklist entries are ignored
    pub fn new(scope_domain: impl Into<String>, user_blacklist: &[String]) -> Self {
        Self {
            scope_domain: scope_domain.into(),
            user_blacklist: user_blacklist
                .iter()
                .filter(|entry| !entry.is_empty())
                .cloned()
                .collect(),
        }
    }

    pub fn scope_domain(&self) -> &str {
        &self.scope_domain
    }

    /// Returns true if the link passes scope, blacklist and extension checks
    pub fn accept(&self, url: &Url) -> bool {
        accept(url, &self.scope_domain, &self.user_blacklist)
    }
}

/// Applies the link acceptance rules
///
/// A URL is accepted iff all of:
/// 1. `scope_domain` is a substring of the URL's host
/// 2. No non-empty `user_blacklist` entry occurs in the URL
/// 3. No [`PLATFORM_BLACKLIST`] entry occurs in the URL
/// 4. The path does not end with an [`EXCLUDED_EXTENSIONS`] suffix
pub fn accept(url: &Url, scope_domain: &str, user_blacklist: &[String]) -> bool {
    let in_scope = url
        .host_str()
        .map_or(false, |host| host.contains(scope_domain));
    if !in_scope {
        return false;
    }

    let link = url.as_str();

    if user_blacklist
        .iter()
        .any(|entry| !entry.is_empty() && link.contains(entry.as_str()))
    {
        return false;
    }

    if PLATFORM_BLACKLIST.iter().any(|entry| link.contains(entry)) {
        return false;
    }

    let path = url.path();
    !EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
