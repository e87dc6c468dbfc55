//! The public crawl handle
//!
//! [`Website`] holds the configuration and the collaborators for a crawl,
//! and the state that outlives it: the visited-link store and the control
//! handle of the current run. Clones share that state, so a clone moved into
//! an observer can call [`Website::stop`] on the crawl it is observing.

use crate::config::{validate, CrawlConfig, ScreenshotConfig};
use crate::crawler::{
    HtmlLinkExtractor, HttpFetcher, LinkExtractor, Page, PageContext, Scheduler, Subscriber,
    SubscriptionSink, VisitedLinks,
};
use crate::output::CrawlSummary;
use crate::screenshot::{Renderer, ScreenshotCapturer};
use crate::state::{CrawlControl, CrawlStatus};
use crate::{ConfigError, CrawlError, CrawlResult, Fetcher};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A crawlable site and the results of its most recent crawl
#[derive(Clone)]
pub struct Website {
    config: CrawlConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    extractor: Arc<dyn LinkExtractor>,
    renderer: Option<Arc<dyn Renderer>>,
    visited: VisitedLinks,
    control: Arc<Mutex<Arc<CrawlControl>>>,
}

/// Per-call crawl options
#[derive(Clone, Default)]
pub struct CrawlOptions {
    /// Receives every completed page
    pub subscriber: Option<Arc<dyn Subscriber>>,

    /// Replaces the configured budget for this crawl only
    pub budget: Option<BTreeMap<String, u32>>,
}

impl CrawlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams each completed page to `f`
    ///
    /// `f` runs on worker tasks and may be called for several pages at once.
    pub fn subscribe<F>(mut self, f: F) -> Self
    where
        F: Fn(&Page) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscriber = Some(Arc::new(f));
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    pub fn with_budget<I, K>(mut self, budget: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        self.budget = Some(budget.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }
}

impl fmt::Debug for CrawlOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlOptions")
            .field("subscribed", &self.subscriber.is_some())
            .field("budget", &self.budget)
            .finish()
    }
}

/// A crawl running on its own task
#[derive(Debug)]
pub struct CrawlTask {
    handle: JoinHandle<CrawlSummary>,
    control: Arc<CrawlControl>,
}

impl CrawlTask {
    /// Waits for the crawl to finish
    pub async fn join(self) -> CrawlResult<CrawlSummary> {
        self.handle
            .await
            .map_err(|e| CrawlError::Task(e.to_string()))
    }

    /// Requests a graceful stop; returns false if the crawl is already over
    pub fn cancel(&self) -> bool {
        self.control.cancel()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn status(&self) -> CrawlStatus {
        self.control.status()
    }
}

/// Links and pages gathered by [`crawl_site`]
#[derive(Debug, Clone, Default)]
pub struct CrawlOutput {
    pub links: Vec<String>,
    pub pages: Vec<Page>,
}

impl Website {
    /// Creates a handle for the site at `url` with default settings
    ///
    /// The URL is checked when a crawl starts, not here.
    pub fn new(url: &str) -> Self {
        Self::from_config(CrawlConfig::new(url))
    }

    /// Creates a handle from a complete configuration, e.g. one loaded
    /// with [`crate::config::load_config`]
    pub fn from_config(config: CrawlConfig) -> Self {
        Self {
            config,
            fetcher: None,
            extractor: Arc::new(HtmlLinkExtractor::new()),
            renderer: None,
            visited: VisitedLinks::new(),
            control: Arc::new(Mutex::new(Arc::new(CrawlControl::new()))),
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.config = self.config.with_user_agent(Some(user_agent));
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.config = self.config.with_headers(headers);
        self
    }

    pub fn with_header(self, name: &str, value: &str) -> Self {
        self.with_headers([(name, value)])
    }

    pub fn with_budget<I, K>(mut self, budget: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        self.config = self.config.with_budget(budget);
        self
    }

    /// Enables screenshot capture; a renderer must also be set
    pub fn with_screenshot(mut self, screenshot: Option<ScreenshotConfig>) -> Self {
        self.config = self.config.with_screenshot(screenshot);
        self
    }

    pub fn with_subdomains(mut self, subdomains: bool) -> Self {
        self.config = self.config.with_subdomains(subdomains);
        self
    }

    pub fn with_tld(mut self, tld: bool) -> Self {
        self.config = self.config.with_tld(tld);
        self
    }

    pub fn with_external_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_external_domains(domains);
        self
    }

    pub fn with_blacklist_url<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_blacklist_url(patterns);
        self
    }

    pub fn with_respect_robots_txt(mut self, respect: bool) -> Self {
        self.config = self.config.with_respect_robots_txt(respect);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config = self.config.with_max_concurrency(max_concurrency);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_delay(delay);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config = self.config.with_request_timeout(timeout);
        self
    }

    pub fn with_http2_prior_knowledge(mut self, enabled: bool) -> Self {
        self.config = self.config.with_http2_prior_knowledge(enabled);
        self
    }

    pub fn with_proxies<I, S>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_proxies(proxies);
        self
    }

    pub fn with_slim_pages(mut self, slim: bool) -> Self {
        self.config = self.config.with_slim_pages(slim);
        self
    }

    pub fn with_return_page_links(mut self, return_links: bool) -> Self {
        self.config = self.config.with_return_page_links(return_links);
        self
    }

    /// Replaces the default reqwest-backed fetcher
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_link_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Crawls the site and waits for the crawl to finish
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl ran to completion or was stopped
    /// * `Err(CrawlError)` - The configuration is invalid or a crawl is already running
    pub async fn crawl(&self) -> CrawlResult<CrawlSummary> {
        self.crawl_with(CrawlOptions::default()).await
    }

    /// Crawls with a page subscriber and/or a budget override
    pub async fn crawl_with(&self, options: CrawlOptions) -> CrawlResult<CrawlSummary> {
        let (scheduler, _) = self.prepare(options)?;
        Ok(scheduler.run().await)
    }

    /// Starts a crawl on a new task and returns immediately
    ///
    /// Configuration errors are returned here, before the task is spawned.
    /// Must be called from within a tokio runtime.
    pub fn crawl_background(&self, options: CrawlOptions) -> CrawlResult<CrawlTask> {
        let (scheduler, control) = self.prepare(options)?;
        Ok(CrawlTask {
            handle: tokio::spawn(scheduler.run()),
            control,
        })
    }

    /// Validates the configuration, installs a fresh control handle and
    /// builds the scheduler
    fn prepare(&self, options: CrawlOptions) -> CrawlResult<(Scheduler, Arc<CrawlControl>)> {
        let mut config = self.config.clone();
        if let Some(budget) = options.budget {
            config.budget = budget;
        }
        validate(&config)?;

        let capturer = match (&config.screenshot, &self.renderer) {
            (Some(screenshot), Some(renderer)) => Some(ScreenshotCapturer::new(
                screenshot.clone(),
                Arc::clone(renderer),
            )),
            (Some(_), None) => {
                return Err(ConfigError::Validation(
                    "Screenshot capture requires a renderer (see Website::with_renderer)"
                        .to_string(),
                )
                .into())
            }
            (None, _) => None,
        };

        let fetcher: Arc<dyn Fetcher> = match &self.fetcher {
            Some(fetcher) => Arc::clone(fetcher),
            None => Arc::new(HttpFetcher::new(&config)?),
        };

        let ctx = PageContext::new(
            Arc::new(config),
            fetcher,
            Arc::clone(&self.extractor),
            capturer,
            SubscriptionSink::new(options.subscriber),
        );

        let control = Arc::new(CrawlControl::new());
        let scheduler = Scheduler::new(ctx, self.visited.clone(), Arc::clone(&control))?;

        {
            let mut current = self.lock_control();
            if current.status().is_active() {
                return Err(CrawlError::AlreadyRunning);
            }
            control.advance(CrawlStatus::Running);
            *current = Arc::clone(&control);
        }

        self.visited.clear();
        tracing::debug!("Prepared crawl of {}", self.config.url);
        Ok((scheduler, control))
    }

    fn lock_control(&self) -> MutexGuard<'_, Arc<CrawlControl>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_control(&self) -> Arc<CrawlControl> {
        Arc::clone(&self.lock_control())
    }

    /// URLs visited by the current or last crawl, in completion order
    pub fn get_links(&self) -> Vec<String> {
        self.visited.snapshot_links()
    }

    /// Requests a graceful stop of the running crawl
    ///
    /// In-flight pages finish and are delivered; nothing new is dispatched
    /// or queued. Returns false if no crawl was running.
    pub fn stop(&self) -> bool {
        let stopped = self.current_control().cancel();
        if stopped {
            tracing::info!("Stop requested for {}", self.config.url);
        }
        stopped
    }

    pub fn status(&self) -> CrawlStatus {
        self.current_control().status()
    }

    /// Number of visited links
    pub fn size(&self) -> usize {
        self.visited.len()
    }

    /// Takes the visited links, leaving the store empty
    pub fn drain_links(&self) -> Vec<String> {
        self.visited.drain()
    }

    pub fn clear(&self) {
        self.visited.clear();
    }
}

impl fmt::Debug for Website {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Website")
            .field("url", &self.config.url)
            .field("status", &self.status())
            .field("visited", &self.size())
            .finish_non_exhaustive()
    }
}

/// Crawls `url` with default settings and returns every link and page
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), arachne::CrawlError> {
/// let output = arachne::crawl_site("https://example.com").await?;
/// for page in &output.pages {
///     println!("{} {}", page.status_code, page.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl_site(url: &str) -> CrawlResult<CrawlOutput> {
    let pages = Arc::new(Mutex::new(Vec::new()));
    let collected = Arc::clone(&pages);

    let website = Website::new(url);
    website
        .crawl_with(CrawlOptions::new().subscribe(move |page| {
            collected
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(page.clone());
            Ok(())
        }))
        .await?;

    let pages = std::mem::take(&mut *pages.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(CrawlOutput {
        links: website.get_links(),
        pages,
    })
}
