//! Arachne: a concurrent, budgeted web-crawling engine
//!
//! This crate crawls a website starting from a seed URL, following links that
//! match the configured domain policy, enforcing request budgets, streaming
//! each fetched page to an optional observer and collecting the set of
//! visited links.
//!
//! # Example
//!
//! ```no_run
//! use arachne::Website;
//!
//! # async fn example() -> Result<(), arachne::CrawlError> {
//! let website = Website::new("https://example.com")
//!     .with_user_agent("BotBot")
//!     .with_budget([("*", 100)]);
//!
//! website.crawl().await?;
//! println!("{:?}", website.get_links());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod screenshot;
pub mod state;
pub mod url;
pub mod website;

use thiserror::Error;

/// Errors that cross the crawl boundary
///
/// Per-page failures never surface here; they are reported through the
/// page observer and [`output::CrawlSummary::issues`].
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("A crawl is already running for this website")]
    AlreadyRunning,

    #[error("Crawl task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// A failed page fetch
///
/// Recorded on the page and in the crawl summary; never fatal to the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Redirect error for {url}: {message}")]
    Redirect { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Returns the URL the failed request was made for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::Redirect { url, .. }
            | Self::Request { url, .. }
            | Self::Body { url, .. } => url,
        }
    }
}

/// A failed screenshot capture
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Renderer failed for {url}: {message}")]
    Backend { url: String, message: String },

    #[error("Failed to write screenshot {path}: {message}")]
    Io { path: String, message: String },
}

/// A page observer that returned an error or panicked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    #[error("Observer failed on {url}: {message}")]
    Failed { url: String, message: String },

    #[error("Observer panicked on {url}: {message}")]
    Panicked { url: String, message: String },
}

/// Result type alias for crawl operations
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{CrawlConfig, ScreenshotConfig};
pub use crawler::{Fetcher, LinkExtractor, Page, Subscriber};
pub use output::{CrawlIssue, CrawlSummary};
pub use screenshot::Renderer;
pub use state::CrawlStatus;
pub use website::{crawl_site, CrawlOptions, CrawlOutput, CrawlTask, Website};
