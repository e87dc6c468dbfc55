//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The [`Fetcher`] trait the scheduler and workers fetch through
//! - Building the reqwest client from the crawl configuration
//! - Error classification into [`FetchError`]

use crate::config::CrawlConfig;
use crate::{ConfigError, FetchError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect::Policy, Client, Proxy};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// A single GET request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub user_agent: Option<String>,
    /// Extra headers keyed by lowercase name
    pub headers: Arc<BTreeMap<String, String>>,
}

impl FetchRequest {
    /// A plain GET with no agent override and no extra headers
    pub fn new(url: Url) -> Self {
        Self {
            url,
            user_agent: None,
            headers: Arc::default(),
        }
    }

    /// Same agent and headers, different URL
    pub fn with_url(&self, url: Url) -> Self {
        Self {
            url,
            user_agent: self.user_agent.clone(),
            headers: Arc::clone(&self.headers),
        }
    }
}

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// URL after redirects
    pub final_url: Url,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub headers: HashMap<String, String>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the body should be parsed for links
    ///
    /// A missing content type is treated as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map_or(true, |ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        })
    }
}

/// Performs one GET for the crawler
///
/// Implementations must be safe to call from many tasks at once. Non-2xx
/// statuses are responses, not errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Default [`Fetcher`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawl configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Ready to use fetcher
    /// * `Err(ConfigError)` - A proxy or client setting was rejected
    pub fn new(config: &CrawlConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

/// Builds an HTTP client with the configured timeouts, proxies and protocol
///
/// # Example
///
/// ```no_run
/// use arachne::config::CrawlConfig;
/// use arachne::crawler::build_http_client;
///
/// let config = CrawlConfig::new("https://example.com").with_user_agent(Some("BotBot"));
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, ConfigError> {
    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

    let mut builder = Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true);

    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }

    if config.http2_prior_knowledge {
        builder = builder.http2_prior_knowledge();
    }

    for proxy in &config.proxies {
        let proxy = Proxy::all(proxy.as_str())
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = request.url.as_str();

        let mut headers = HeaderMap::new();
        for (name, value) in request.headers.iter() {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Skipping invalid header '{}'", name),
            }
        }
        if let Some(agent) = request
            .user_agent
            .as_deref()
            .and_then(|ua| HeaderValue::from_str(ua).ok())
        {
            headers.insert(USER_AGENT, agent);
        }

        let response = self
            .client
            .get(request.url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(FetchResponse {
            status,
            final_url,
            body: body.to_vec(),
            content_type,
            headers: response_headers,
        })
    }
}

/// Maps a reqwest error onto the crawler's error kinds
fn classify_error(url: &str, error: &reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            message: error.to_string(),
        }
    } else if error.is_redirect() {
        FetchError::Redirect {
            url,
            message: error.to_string(),
        }
    } else {
        FetchError::Request {
            url,
            message: error.to_string(),
        }
    }
}
