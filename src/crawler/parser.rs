//! HTML link extraction
//!
//! Links come from `<a href>` and `<link rel="canonical">` elements, in
//! document order. Download anchors and uncrawlable schemes are skipped;
//! `rel="nofollow"` links are still followed.

use crate::url::resolve_link;
use scraper::{Html, Selector};
use url::Url;

/// Extracts crawlable links from a fetched page
///
/// Implementations must be pure: the same input yields the same output.
pub trait LinkExtractor: Send + Sync {
    /// Returns absolute URLs in the order they appear in the document
    fn extract(&self, html: &str, base_url: &Url) -> Vec<Url>;
}

/// Default [`LinkExtractor`] built on scraper
#[derive(Debug, Clone, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> Vec<Url> {
        extract_links(html, base_url)
    }
}

/// Parses HTML and returns every crawlable link
///
/// # Example
///
/// ```
/// use arachne::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/b">B</a><a href="mailto:x@y.z">mail</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/b");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("a[href], link[rel='canonical'][href]") else {
        return Vec::new();
    };

    // A <base href> changes how relative links resolve
    let base = Selector::parse("base[href]")
        .ok()
        .and_then(|s| document.select(&s).next())
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| base_url.join(href.trim()).ok())
        .unwrap_or_else(|| base_url.clone());

    document
        .select(&selector)
        .filter(|element| {
            !(element.value().name() == "a" && element.value().attr("download").is_some())
        })
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, &base))
        .collect()
}

/// Extracts the page title from HTML
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
