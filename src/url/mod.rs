//! URL handling module for Arachne
//!
//! This module provides URL normalization, link resolution, host extraction,
//! wildcard matching and the domain policy that decides which discovered
//! links belong to the crawl.

mod domain;
mod normalize;

use crate::config::CrawlConfig;
use crate::ConfigError;
use regex::Regex;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, matches_wildcard, strip_www, without_tld};
pub use normalize::{normalize, normalize_url, resolve_link};

/// Decides which URLs are in scope for a crawl
///
/// Rules are checked in this order:
/// 1. Blacklist regexes (a match always rejects)
/// 2. Exact seed host, or a host the seed redirected to
/// 3. Subdomains of the seed host (when enabled)
/// 4. Same name under another top-level domain (when enabled)
/// 5. External domain patterns
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    host: String,
    subdomains: bool,
    tld: bool,
    external: Vec<String>,
    blacklist: Vec<Regex>,
    aliases: Vec<String>,
}

impl DomainPolicy {
    /// Builds the policy for a crawl rooted at `seed`
    ///
    /// # Returns
    ///
    /// * `Ok(DomainPolicy)` - The compiled policy
    /// * `Err(ConfigError)` - The seed has no host or a blacklist regex is invalid
    pub fn from_config(config: &CrawlConfig, seed: &Url) -> Result<Self, ConfigError> {
        let host = extract_domain(seed)
            .ok_or_else(|| ConfigError::InvalidUrl(format!("Seed URL '{}' has no host", seed)))?;

        let blacklist = config
            .blacklist_url
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    ConfigError::InvalidPattern(format!("Blacklist pattern '{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            host,
            subdomains: config.subdomains,
            tld: config.tld,
            external: config
                .external_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            blacklist,
            aliases: Vec::new(),
        })
    }

    /// Returns true if `url` may be crawled
    pub fn allows(&self, url: &Url) -> bool {
        let Some(host) = extract_domain(url) else {
            return false;
        };

        if self.is_blacklisted(url) {
            return false;
        }

        if host == self.host || self.aliases.contains(&host) {
            return true;
        }

        let seed_base = strip_www(&self.host);

        if self.subdomains && matches_wildcard(&format!("*.{}", seed_base), &host) {
            return true;
        }

        if self.tld {
            let seed_name = without_tld(seed_base);
            let candidate = strip_www(&host);
            let candidate_name = without_tld(candidate);
            if candidate_name == seed_name && candidate != candidate_name {
                return true;
            }
            if self.subdomains && matches_wildcard(&format!("*.{}", seed_name), candidate_name) {
                return true;
            }
        }

        self.external
            .iter()
            .any(|pattern| matches_wildcard(pattern, &host))
    }

    /// Returns true if any blacklist regex matches the URL
    pub fn is_blacklisted(&self, url: &Url) -> bool {
        self.blacklist.iter().any(|re| re.is_match(url.as_str()))
    }

    /// Accepts the host of `url` as if it were the seed host
    ///
    /// Returns true if the host was not already accepted this way.
    pub fn add_alias(&mut self, url: &Url) -> bool {
        match extract_domain(url) {
            Some(host) if host != self.host && !self.aliases.contains(&host) => {
                self.aliases.push(host);
                true
            }
            _ => false,
        }
    }
}
