use crate::UrlError;
use url::Url;

/// Normalizes a URL into its frontier key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not http(s) or has no host
/// 3. Remove the fragment (everything after #)
///
/// Nothing else is rewritten: `/a#x` and `/a#y` collapse to `/a`, but
/// `/a` and `/a/` stay distinct.
///
/// # Examples
///
/// ```
/// use product_ripple::url::normalize_url;
///
/// let url = normalize_url("https://shop.example.com/p/1#reviews").unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/p/1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(strip_fragment(url))
}

/// Resolves an href against the origin of the page it was found on and drops
/// the fragment
///
/// Relative paths join onto the site root (`boots` on `/category/shoes` is
/// `/boots`), and a fragment-only href points at the root. Returns None for
/// empty or unparseable hrefs. Non-http schemes are kept; the link filter
/// decides what to do with them.
pub fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let base = origin_url(page_url).unwrap_or_else(|| page_url.clone());
    base.join(href).ok().map(strip_fragment)
}

/// `scheme://host[:port]/` of a URL, or None if its origin is opaque
pub fn origin_url(url: &Url) -> Option<Url> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Url::parse(&origin.ascii_serialization()).ok()
}

fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
