use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and normalizes an absolute URL string
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme and a host
/// 3. Remove the fragment
/// 4. Remove an empty query string (trailing `?`)
///
/// Host case and dot segments are normalized by the parser itself. Scheme,
/// `www.` and trailing slashes are left alone so the URL that gets fetched is
/// the URL that was linked.
///
/// # Examples
///
/// ```
/// use arachne::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/a/../b?#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize(url)
}

/// Normalizes an already parsed URL
pub fn normalize(mut url: Url) -> UrlResult<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Resolves an `href` against the page it was found on
///
/// Returns `None` for links that can never be crawled: empty hrefs,
/// fragment-only anchors, `javascript:`, `mailto:`, `tel:` and `data:` URIs,
/// and anything that does not resolve to an HTTP(S) URL.
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base.join(href).ok().and_then(|url| normalize(url).ok())
}
