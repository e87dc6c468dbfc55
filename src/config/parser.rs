use crate::config::types::CrawlConfig;
use crate::config::validation::validate;
use crate::ConfigResult;
use std::path::Path;

/// Loads and parses a crawl configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use arachne::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Seed: {}", config.url);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<CrawlConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates a crawl configuration from TOML text
pub fn parse_config(content: &str) -> ConfigResult<CrawlConfig> {
    let mut config: CrawlConfig = toml::from_str(content)?;

    // Header names are case-insensitive
    config.headers = std::mem::take(&mut config.headers)
        .into_iter()
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value))
        .collect();

    validate(&config)?;

    Ok(config)
}
