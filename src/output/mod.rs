//! Output module for crawl results
//!
//! This module handles:
//! - The summary returned by every crawl
//! - Per-page issues (fetch, screenshot and observer failures)
//! - Markdown reports of a finished crawl

mod markdown;
mod summary;

pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use summary::{CrawlIssue, CrawlSummary, PageError};
