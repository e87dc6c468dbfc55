//! Robots.txt caching with a 24 hour lifetime

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};

/// How long fetched robots.txt rules stay valid
pub const ROBOTS_TTL_HOURS: i64 = 24;

/// Robots.txt rules for a host along with when they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: ParsedRobots,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps freshly fetched rules, stamped with the current time
    pub fn new(rules: ParsedRobots) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Returns true once the rules are older than the cache lifetime
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(ROBOTS_TTL_HOURS)
    }

    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        self.rules.is_allowed(url, agent)
    }

    pub fn crawl_delay(&self, agent: &str) -> Option<std::time::Duration> {
        self.rules.crawl_delay(agent)
    }
}
