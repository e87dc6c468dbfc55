//! Crawl summary and per-page diagnostics
use crate::state::CrawlStatus;
use crate::{FetchError, ObserverError, RenderError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// A non-fatal failure tied to one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    Fetch(FetchError),
    Render(RenderError),
    Observer(ObserverError),
    /// Link extraction or the page task itself panicked
    Panicked(String),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "{}", e),
            Self::Render(e) => write!(f, "{}", e),
            Self::Observer(e) => write!(f, "{}", e),
            Self::Panicked(message) => write!(f, "Page processing panicked: {}", message),
        }
    }
}

/// A problem recorded while crawling a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlIssue {
    pub url: String,
    pub error: PageError,
}

impl CrawlIssue {
    pub fn new(url: impl Into<String>, error: PageError) -> Self {
        Self {
            url: url.into(),
            error,
        }
    }

    /// Short label for the kind of issue
    pub fn kind(&self) -> &'static str {
        match self.error {
            PageError::Fetch(_) => "fetch",
            PageError::Render(_) => "screenshot",
            PageError::Observer(_) => "observer",
            PageError::Panicked(_) => "panic",
        }
    }
}

impl fmt::Display for CrawlIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind(), self.error)
    }
}

/// Outcome of one crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,

    /// Final status, always `Finished`
    pub status: CrawlStatus,

    /// True if the crawl ended because stop was requested
    pub stopped: bool,

    /// Pages whose fetch completed (successful or not)
    pub pages_visited: usize,

    /// Pages that failed to fetch or answered 4xx/5xx
    pub pages_failed: usize,

    /// Distinct in-scope URLs discovered, including the seed
    pub links_discovered: usize,

    /// URLs dropped because a budget was exhausted
    pub budget_rejected: usize,

    /// URLs dropped because robots.txt disallowed them
    pub robots_rejected: usize,

    pub issues: Vec<CrawlIssue>,
}

impl CrawlSummary {
    /// Percentage of visited pages that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        let succeeded = self.pages_visited.saturating_sub(self.pages_failed);
        succeeded as f64 / self.pages_visited as f64 * 100.0
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages visited ({} failed), {} discovered, {} over budget, {} blocked by robots.txt in {:.2}s",
            self.pages_visited,
            self.pages_failed,
            self.links_discovered,
            self.budget_rejected,
            self.robots_rejected,
            self.elapsed.as_secs_f64()
        )?;
        if self.stopped {
            write!(f, " (stopped)")?;
        }
        Ok(())
    }
}
