//! Fluent builder methods for [`CrawlConfig`]
//!
//! Every method consumes the configuration and returns the updated value, so
//! calls chain. Map-valued settings merge per key; the last write wins.

use crate::config::types::{
    CrawlConfig, ScreenshotConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_MS,
};
use std::time::Duration;

impl CrawlConfig {
    /// Creates a configuration for crawling `url` with default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subdomains: false,
            tld: false,
            external_domains: Vec::new(),
            blacklist_url: Vec::new(),
            user_agent: None,
            headers: Default::default(),
            budget: Default::default(),
            screenshot: None,
            respect_robots_txt: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            delay_ms: 0,
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
            http2_prior_knowledge: false,
            proxies: Vec::new(),
            slim_pages: false,
            return_page_links: false,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<&str>) -> Self {
        self.user_agent = user_agent.map(str::to_string);
        self
    }

    /// Merges request headers; names are case-insensitive
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers
                .insert(name.as_ref().trim().to_ascii_lowercase(), value.into());
        }
        self
    }

    /// Removes every configured request header
    pub fn clear_headers(mut self) -> Self {
        self.headers.clear();
        self
    }

    /// Merges budget rules, mapping a URL pattern to its maximum visit count
    pub fn with_budget<I, K>(mut self, budget: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        for (pattern, limit) in budget {
            self.budget.insert(pattern.into(), limit);
        }
        self
    }

    pub fn with_screenshot(mut self, screenshot: Option<ScreenshotConfig>) -> Self {
        self.screenshot = screenshot;
        self
    }

    pub fn with_subdomains(mut self, subdomains: bool) -> Self {
        self.subdomains = subdomains;
        self
    }

    pub fn with_tld(mut self, tld: bool) -> Self {
        self.tld = tld;
        self
    }

    pub fn with_external_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for domain in domains {
            let domain = domain.into().to_ascii_lowercase();
            if !self.external_domains.contains(&domain) {
                self.external_domains.push(domain);
            }
        }
        self
    }

    pub fn with_blacklist_url<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            let pattern = pattern.into();
            if !self.blacklist_url.contains(&pattern) {
                self.blacklist_url.push(pattern);
            }
        }
        self
    }

    pub fn with_respect_robots_txt(mut self, respect: bool) -> Self {
        self.respect_robots_txt = respect;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Minimum delay between two requests to the same host
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn with_http2_prior_knowledge(mut self, enabled: bool) -> Self {
        self.http2_prior_knowledge = enabled;
        self
    }

    pub fn with_proxies<I, S>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proxies = proxies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_slim_pages(mut self, slim: bool) -> Self {
        self.slim_pages = slim;
        self
    }

    pub fn with_return_page_links(mut self, return_links: bool) -> Self {
        self.return_page_links = return_links;
        self
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Per-host politeness delay as a duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = CrawlConfig::new("https://example.com");
        assert_eq!(config.url, "https://example.com");
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(config.budget.is_empty());
        assert!(!config.respect_robots_txt);
    }

    #[test]
    fn test_headers_case_insensitive_last_write_wins() {
        let config = CrawlConfig::new("https://example.com")
            .with_headers([("Authorization", "first")])
            .with_headers([("AUTHORIZATION", "second"), ("X-Trace", "1")]);

        assert_eq!(config.headers.len(), 2);
        assert_eq!(config.headers["authorization"], "second");
        assert_eq!(config.headers["x-trace"], "1");

        let config = config.clear_headers().with_headers([("Accept", "text/html")]);
        assert_eq!(config.headers.len(), 1);
    }

    #[test]
    fn test_budget_merges_per_pattern() {
        let config = CrawlConfig::new("https://example.com")
            .with_budget([("*", 10), ("/docs", 2)])
            .with_budget([("*", 5)]);

        assert_eq!(config.budget["*"], 5);
        assert_eq!(config.budget["/docs"], 2);
    }

    #[test]
    fn test_builder_is_idempotent() {
        let once = CrawlConfig::new("https://example.com")
            .with_user_agent(Some("BotBot"))
            .with_external_domains(["docs.example.org"]);
        let twice = once
            .clone()
            .with_user_agent(Some("BotBot"))
            .with_external_domains(["docs.example.org"]);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_delay_and_timeout() {
        let config = CrawlConfig::new("https://example.com")
            .with_delay(Duration::from_millis(250))
            .with_request_timeout(None);

        assert_eq!(config.delay(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), None);
    }
}
