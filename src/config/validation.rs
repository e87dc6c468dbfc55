use crate::config::types::{CrawlConfig, ScreenshotConfig, GLOBAL_BUDGET_PATTERN};
use crate::ConfigError;
use regex::Regex;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_seed_url(&config.url)?;
    validate_limits(config)?;
    validate_user_agent(config.user_agent.as_deref())?;
    validate_headers(&config.headers)?;
    validate_budget(&config.budget)?;
    validate_external_domains(&config.external_domains)?;
    validate_blacklist(&config.blacklist_url)?;
    validate_proxies(&config.proxies)?;
    if let Some(screenshot) = &config.screenshot {
        validate_screenshot(screenshot)?;
    }
    Ok(())
}

/// Validates the seed URL: absolute, HTTP(S), with a host
fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

fn validate_limits(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > 1000 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and 1000, got {}",
            config.max_concurrency
        )));
    }

    if config.request_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent(user_agent: Option<&str>) -> Result<(), ConfigError> {
    let Some(user_agent) = user_agent else {
        return Ok(());
    };

    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    HeaderValue::from_str(user_agent).map_err(|_| {
        ConfigError::InvalidHeader(format!("user agent '{}' is not a valid header value", user_agent))
    })?;

    Ok(())
}

fn validate_headers(headers: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(format!("invalid header name '{}'", name)))?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::InvalidHeader(format!("invalid value for header '{}'", name))
        })?;
    }
    Ok(())
}

/// Validates budget rules
///
/// A pattern is `"*"`, a path prefix starting with `/`, or an absolute HTTP(S)
/// URL prefix. A `*` may only appear as the final character.
pub fn validate_budget(budget: &BTreeMap<String, u32>) -> Result<(), ConfigError> {
    for pattern in budget.keys() {
        validate_budget_pattern(pattern)?;
    }
    Ok(())
}

fn validate_budget_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern == GLOBAL_BUDGET_PATTERN {
        return Ok(());
    }

    if pattern.trim().is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Budget pattern cannot be empty".to_string(),
        ));
    }

    let body = pattern.strip_suffix('*').unwrap_or(pattern);
    if body.contains('*') {
        return Err(ConfigError::InvalidPattern(format!(
            "Budget pattern '{}' may only use '*' as its last character",
            pattern
        )));
    }

    if body.starts_with('/') {
        return Ok(());
    }

    if body.contains("://") {
        let url = Url::parse(body).map_err(|e| {
            ConfigError::InvalidPattern(format!("Budget pattern '{}': {}", pattern, e))
        })?;
        if url.scheme() == "http" || url.scheme() == "https" {
            return Ok(());
        }
    }

    Err(ConfigError::InvalidPattern(format!(
        "Budget pattern '{}' must be '*', a path starting with '/', or an HTTP(S) URL",
        pattern
    )))
}

fn validate_external_domains(domains: &[String]) -> Result<(), ConfigError> {
    for domain in domains {
        validate_domain_pattern(domain)?;
    }
    Ok(())
}

fn validate_blacklist(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Blacklist pattern '{}': {}", pattern, e))
        })?;
    }
    Ok(())
}

fn validate_proxies(proxies: &[String]) -> Result<(), ConfigError> {
    for proxy in proxies {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }
    Ok(())
}

fn validate_screenshot(config: &ScreenshotConfig) -> Result<(), ConfigError> {
    let cdp = &config.params.cdp_params;

    if let Some(quality) = cdp.quality {
        if quality > 100 {
            return Err(ConfigError::Validation(format!(
                "screenshot quality must be between 0 and 100, got {}",
                quality
            )));
        }
    }

    if let Some(clip) = cdp.clip {
        if clip.width <= 0.0 || clip.height <= 0.0 || clip.scale <= 0.0 {
            return Err(ConfigError::Validation(
                "screenshot clip width, height and scale must be positive".to_string(),
            ));
        }
    }

    if !config.save && !config.bytes {
        tracing::warn!("Screenshots are enabled but neither saved nor returned");
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)
    } else {
        validate_domain_string(pattern)
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{ClipViewport, ScreenshotConfig};

    #[test]
    fn test_validate_default_config() {
        let config = CrawlConfig::new("https://example.com");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_seed_url() {
        assert!(validate_seed_url("https://example.com/").is_ok());
        assert!(validate_seed_url("http://127.0.0.1:8080/").is_ok());

        assert!(validate_seed_url("not a url").is_err());
        assert!(validate_seed_url("ftp://example.com/").is_err());
        assert!(validate_seed_url("/relative/path").is_err());
    }

    #[test]
    fn test_validate_budget_pattern() {
        assert!(validate_budget_pattern("*").is_ok());
        assert!(validate_budget_pattern("/docs").is_ok());
        assert!(validate_budget_pattern("/docs/*").is_ok());
        assert!(validate_budget_pattern("https://example.com/blog").is_ok());

        assert!(validate_budget_pattern("").is_err());
        assert!(validate_budget_pattern("docs").is_err());
        assert!(validate_budget_pattern("/a*/b").is_err());
        assert!(validate_budget_pattern("ftp://example.com/").is_err());
    }

    #[test]
    fn test_validate_concurrency() {
        let config = CrawlConfig::new("https://example.com").with_max_concurrency(0);
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_validate_headers() {
        let config = CrawlConfig::new("https://example.com")
            .with_headers([("authorization", "Something ")]);
        assert!(validate(&config).is_ok());

        let config = CrawlConfig::new("https://example.com").with_headers([("bad header", "x")]);
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidHeader(_)
        ));

        let config = CrawlConfig::new("https://example.com").with_headers([("x-ok", "line\nbreak")]);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_user_agent() {
        assert!(validate_user_agent(None).is_ok());
        assert!(validate_user_agent(Some("BotBot/1.0")).is_ok());
        assert!(validate_user_agent(Some("   ")).is_err());
    }

    #[test]
    fn test_validate_blacklist_regex() {
        assert!(validate_blacklist(&["/admin.*".to_string()]).is_ok());
        assert!(validate_blacklist(&["(unclosed".to_string()]).is_err());
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("sub.example.com").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example.com.").is_err());
        assert!(validate_domain_pattern("exa mple.com").is_err());
    }

    #[test]
    fn test_validate_screenshot() {
        let mut screenshot = ScreenshotConfig {
            save: true,
            ..Default::default()
        };
        assert!(validate_screenshot(&screenshot).is_ok());

        screenshot.params.cdp_params.quality = Some(101);
        assert!(validate_screenshot(&screenshot).is_err());

        screenshot.params.cdp_params.quality = Some(80);
        screenshot.params.cdp_params.clip = Some(ClipViewport {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 100.0,
            scale: 1.0,
        });
        assert!(validate_screenshot(&screenshot).is_err());
    }
}
