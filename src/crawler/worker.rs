//! Per-page work: fetch, extract, capture, deliver
//!
//! Workers run concurrently in the scheduler's task set. Everything a worker
//! needs is in the shared [`PageContext`]; the only thing it sends back is a
//! [`PageOutcome`].

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{FetchRequest, Fetcher};
use crate::crawler::page::Page;
use crate::crawler::parser::LinkExtractor;
use crate::crawler::sink::{panic_message, SubscriptionSink};
use crate::output::{CrawlIssue, PageError};
use crate::screenshot::ScreenshotCapturer;
use chrono::Utc;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use url::Url;

/// Collaborators shared by every worker of one crawl
pub struct PageContext {
    pub config: Arc<CrawlConfig>,
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub capturer: Option<ScreenshotCapturer>,
    pub sink: SubscriptionSink,
    headers: Arc<BTreeMap<String, String>>,
}

impl PageContext {
    pub fn new(
        config: Arc<CrawlConfig>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        capturer: Option<ScreenshotCapturer>,
        sink: SubscriptionSink,
    ) -> Self {
        let headers = Arc::new(config.headers.clone());
        Self {
            config,
            fetcher,
            extractor,
            capturer,
            sink,
            headers,
        }
    }

    /// A GET for `url` carrying the configured agent and headers
    pub fn request(&self, url: Url) -> FetchRequest {
        FetchRequest {
            url,
            user_agent: self.config.user_agent.clone(),
            headers: Arc::clone(&self.headers),
        }
    }
}

/// What a worker reports back to the scheduler
#[derive(Debug)]
pub struct PageOutcome {
    /// The URL that was dispatched
    pub url: Url,

    /// Where the fetch ended up after redirects, if it got a response
    pub final_url: Option<Url>,

    /// Links found on the page, in document order
    pub links: Vec<Url>,

    /// True if the fetch failed or the server answered 4xx/5xx
    pub failed: bool,

    pub issues: Vec<CrawlIssue>,
}

/// Processes one URL
///
/// The page is delivered to the observer before the outcome is returned, so
/// a stop issued from the observer is seen before this page's links are
/// queued.
pub async fn process_page(ctx: Arc<PageContext>, url: Url, is_seed: bool) -> PageOutcome {
    let mut issues = Vec::new();

    tracing::debug!("Fetching {}", url);
    let mut final_url = None;
    let (mut page, links) = match ctx.fetcher.fetch(&ctx.request(url.clone())).await {
        Ok(response) => {
            let links = if response.is_success() && response.is_html() {
                let html = String::from_utf8_lossy(&response.body);
                let extracted = catch_unwind(AssertUnwindSafe(|| {
                    ctx.extractor.extract(&html, &response.final_url)
                }));
                extracted.unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    tracing::error!("Link extraction panicked on {}: {}", url, message);
                    issues.push(CrawlIssue::new(url.as_str(), PageError::Panicked(message)));
                    Vec::new()
                })
            } else {
                Vec::new()
            };

            tracing::debug!(
                "Fetched {} ({}), {} links",
                url,
                response.status,
                links.len()
            );

            let page = Page {
                url: url.to_string(),
                final_url: response.final_url.to_string(),
                status_code: response.status,
                body: (!ctx.config.slim_pages).then_some(response.body),
                content_type: response.content_type,
                headers: Some(response.headers),
                fetched_at: Utc::now(),
                error: None,
                screenshot: None,
                screenshot_path: None,
                links: None,
            };
            final_url = Some(response.final_url);
            (page, links)
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            issues.push(CrawlIssue::new(e.url(), PageError::Fetch(e.clone())));
            (Page::failed(&url, e), Vec::new())
        }
    };

    if let Some(capturer) = ctx.capturer.as_ref().filter(|_| page.error.is_none()) {
        match capturer.capture(&url, is_seed).await {
            Ok(Some(captured)) => {
                page.screenshot = captured.bytes;
                page.screenshot_path = captured.path;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to capture screenshot of {}: {}", url, e);
                issues.push(CrawlIssue::new(url.as_str(), PageError::Render(e)));
            }
        }
    }

    if ctx.config.return_page_links {
        page.links = Some(links.iter().map(Url::to_string).collect());
    }

    if let Err(e) = ctx.sink.deliver(&page) {
        tracing::warn!("{}", e);
        issues.push(CrawlIssue::new(url.as_str(), PageError::Observer(e)));
    }

    PageOutcome {
        failed: page.is_error(),
        url,
        final_url,
        links,
        issues,
    }
}
