//! Link discovery
//!
//! Pulls every anchor out of a parsed page, resolves it against the page's
//! origin to an absolute, fragment-free URL and runs it through the
//! [`LinkFilter`].

use crate::output::CrawlLog;
use crate::url::{resolve_link, LinkFilter};
use crate::RippleError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts all anchor targets from the document
///
/// The anchor selector matches at any depth, so links wrapped in `div`,
/// `nav`, `ul`/`li` or `span` containers are found along with top-level
/// ones. Unparseable hrefs are skipped; if the document cannot be scanned at
/// all the failure is logged and the set is empty.
///
/// # Example
///
/// ```
/// use product_ripple::crawler::extract_links;
/// use product_ripple::output::CrawlLog;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<nav><ul><li><a href="/p/1#top">Boot</a></li></ul></nav>"#);
/// let base = Url::parse("https://shop.example.com/").unwrap();
/// let links = extract_links(&html, &base, &CrawlLog::silent());
/// assert!(links.contains(&Url::parse("https://shop.example.com/p/1").unwrap()));
/// ```
pub fn extract_links(document: &Html, base_url: &Url, log: &CrawlLog) -> HashSet<Url> {
    match collect_links(document, base_url) {
        Ok(links) => links,
        Err(e) => {
            log.error(format!("Error while fetching links from {}: {}", base_url, e));
            HashSet::new()
        }
    }
}

/// Extracts links and keeps only the ones the filter accepts
pub fn discover_links(
    document: &Html,
    base_url: &Url,
    filter: &LinkFilter,
    log: &CrawlLog,
) -> HashSet<Url> {
    extract_links(document, base_url, log)
        .into_iter()
        .filter(|link| filter.accept(link))
        .collect()
}

fn collect_links(document: &Html, base_url: &Url) -> Result<HashSet<Url>, RippleError> {
    let selector = Selector::parse("a[href]").map_err(|e| RippleError::HtmlParse {
        url: base_url.to_string(),
        message: format!("{:?}", e),
    })?;

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect())
}
