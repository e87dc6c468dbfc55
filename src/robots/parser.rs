//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate; crawl delays
//! are read directly from the user-agent groups.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt rules for one host
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content, `None` means allow everything
    content: Option<String>,
}

impl ParsedRobots {
    /// Creates rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// Creates permissive rules
    ///
    /// Used when robots.txt is missing, unreachable or returns an error status.
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Checks if a URL is allowed for the given user agent token
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `agent` - The user agent product token (e.g. "BotBot")
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        match self.content.as_deref() {
            None | Some("") => true,
            Some(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, agent, url)
            }
        }
    }

    /// Gets the crawl delay that applies to the given user agent token
    ///
    /// A group naming the agent takes precedence over the `*` group. Agent
    /// names are compared case-insensitively.
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - The crawl delay
    /// * `None` - If no applicable crawl delay is specified
    pub fn crawl_delay(&self, agent: &str) -> Option<Duration> {
        let content = self.content.as_deref()?;
        let agent = agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut group_open = false;
        let mut for_agent: Option<f64> = None;
        let mut for_wildcard: Option<f64> = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // Consecutive user-agent lines share one group
                    if !group_open {
                        group.clear();
                        group_open = true;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_open = false;
                    let Ok(seconds) = value.parse::<f64>() else {
                        continue;
                    };
                    if !seconds.is_finite() || seconds < 0.0 {
                        continue;
                    }
                    if group.iter().any(|ua| *ua == agent) {
                        for_agent.get_or_insert(seconds);
                    } else if group.iter().any(|ua| ua == "*") {
                        for_wildcard.get_or_insert(seconds);
                    }
                }
                _ => group_open = false,
            }
        }

        for_agent.or(for_wildcard).map(Duration::from_secs_f64)
    }
}
