use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default number of in-flight page fetches
pub const DEFAULT_MAX_CONCURRENCY: usize = 20;

/// Default request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Budget pattern that applies to every URL
pub const GLOBAL_BUDGET_PATTERN: &str = "*";

/// Main configuration structure for a crawl
///
/// Built once, either from TOML or through the `with_*` builder methods, and
/// never mutated while a crawl is running.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// The seed URL the crawl starts from
    pub url: String,

    /// Follow links to subdomains of the seed host
    #[serde(default)]
    pub subdomains: bool,

    /// Follow links to the seed domain under any top-level domain
    #[serde(default)]
    pub tld: bool,

    /// Additional hosts to follow (e.g. "docs.example.org" or "*.example.org")
    #[serde(default)]
    pub external_domains: Vec<String>,

    /// Regular expressions for URLs that must never be crawled
    #[serde(default)]
    pub blacklist_url: Vec<String>,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Extra request headers, keyed by lowercase header name
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Maximum visit counts keyed by URL pattern ("*" is global)
    #[serde(default)]
    pub budget: BTreeMap<String, u32>,

    /// Screenshot capture settings
    #[serde(default)]
    pub screenshot: Option<ScreenshotConfig>,

    /// Respect robots.txt allow/disallow rules and crawl delays
    #[serde(default)]
    pub respect_robots_txt: bool,

    /// Maximum number of concurrent page fetches
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(default)]
    pub delay_ms: u64,

    /// Request timeout (milliseconds), `None` disables the timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: Option<u64>,

    /// Only use HTTP/2
    #[serde(default)]
    pub http2_prior_knowledge: bool,

    /// Proxy URLs used for all requests
    #[serde(default)]
    pub proxies: Vec<String>,

    /// Drop page bodies before delivering pages to the observer
    #[serde(default)]
    pub slim_pages: bool,

    /// Attach the links extracted from each page to the delivered page
    #[serde(default)]
    pub return_page_links: bool,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_request_timeout_ms() -> Option<u64> {
    Some(DEFAULT_REQUEST_TIMEOUT_MS)
}

/// Screenshot capture configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ScreenshotConfig {
    /// Parameters passed to the renderer
    #[serde(default)]
    pub params: ScreenshotParams,

    /// Attach the captured image bytes to the page
    #[serde(default)]
    pub bytes: bool,

    /// Write the captured image to `output_dir`
    #[serde(default)]
    pub save: bool,

    /// Directory screenshots are written to (defaults to `./storage`)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Which pages to capture
    #[serde(default)]
    pub scope: ScreenshotScope,
}

/// Which pages receive a screenshot
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenshotScope {
    /// Every visited page
    #[default]
    AllPages,
    /// Only the seed page
    SeedOnly,
}

/// Page-level render parameters
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ScreenshotParams {
    /// Low level capture parameters
    #[serde(default)]
    pub cdp_params: CdpScreenshotParams,

    /// Capture the full scrollable page
    #[serde(default)]
    pub full_page: bool,

    /// Render with a transparent background
    #[serde(default)]
    pub omit_background: bool,
}

/// Capture parameters in the shape of the DevTools `Page.captureScreenshot` call
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CdpScreenshotParams {
    #[serde(default)]
    pub format: Option<CaptureFormat>,

    /// Compression quality 0..=100 (jpeg/webp only)
    #[serde(default)]
    pub quality: Option<u8>,

    #[serde(default)]
    pub clip: Option<ClipViewport>,

    #[serde(default)]
    pub from_surface: Option<bool>,

    #[serde(default)]
    pub capture_beyond_viewport: Option<bool>,
}

/// Image format of a capture
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl CaptureFormat {
    /// File extension used when saving captures in this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }
}

/// Region of the page to capture
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ClipViewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_clip_scale")]
    pub scale: f64,
}

fn default_clip_scale() -> f64 {
    1.0
}
