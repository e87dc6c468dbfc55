//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt files. Fetching goes
//! through the crawl's [`Fetcher`] so the same agent, headers and proxies
//! apply.

mod cache;
mod parser;

pub use cache::{CachedRobots, ROBOTS_TTL_HOURS};
pub use parser::ParsedRobots;

use crate::crawler::{FetchRequest, Fetcher, DEFAULT_USER_AGENT};
use url::Url;

/// Returns the robots.txt location for the host serving `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    let mut robots = url.clone();
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    robots.host_str()?;
    Some(robots)
}

/// Returns the product token robots.txt groups are matched against
///
/// `"BotBot/1.0 (+https://bot.example)"` becomes `"BotBot"`.
pub fn agent_token(user_agent: Option<&str>) -> &str {
    let agent = user_agent.unwrap_or(DEFAULT_USER_AGENT);
    agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .find(|part| !part.is_empty())
        .unwrap_or(agent)
}

/// Fetches robots.txt for the host of `template.url`
///
/// Any failure or non-2xx status yields permissive rules.
///
/// # Arguments
///
/// * `fetcher` - The fetcher used for the crawl
/// * `template` - A request for any URL on the host; its agent and headers are reused
pub async fn fetch_robots(fetcher: &dyn Fetcher, template: &FetchRequest) -> ParsedRobots {
    let Some(url) = robots_url(&template.url) else {
        return ParsedRobots::allow_all();
    };

    tracing::debug!("Fetching robots.txt from {}", url);

    match fetcher.fetch(&template.with_url(url.clone())).await {
        Ok(response) if response.is_success() => {
            ParsedRobots::from_content(&String::from_utf8_lossy(&response.body))
        }
        Ok(response) => {
            tracing::debug!(
                "robots.txt at {} returned {}, allowing all",
                url,
                response.status
            );
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch robots.txt at {}: {}", url, e);
            ParsedRobots::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_url() {
        let url = Url::parse("https://example.com:8443/a/b?x=1#frag").unwrap();
        assert_eq!(
            robots_url(&url).unwrap().as_str(),
            "https://example.com:8443/robots.txt"
        );
    }

    #[test]
    fn test_agent_token() {
        assert_eq!(agent_token(Some("BotBot")), "BotBot");
        assert_eq!(agent_token(Some("BotBot/1.0 (+https://bot.example)")), "BotBot");
        assert_eq!(agent_token(Some("Mozilla 5.0")), "Mozilla");
        assert_eq!(agent_token(None), "arachne");
    }
}
