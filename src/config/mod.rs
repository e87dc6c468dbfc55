//! Configuration module for Arachne
//!
//! This module holds the crawl configuration, its fluent builder, TOML loading
//! and validation.
//!
//! # Example
//!
//! ```no_run
//! use arachne::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use max concurrency: {}", config.max_concurrency);
//! ```

mod builder;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CaptureFormat, CdpScreenshotParams, ClipViewport, CrawlConfig, ScreenshotConfig,
    ScreenshotParams, ScreenshotScope, DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_MS,
    GLOBAL_BUDGET_PATTERN,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_budget};
