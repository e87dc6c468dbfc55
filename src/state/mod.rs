//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlStatus` / `CrawlControl`: the crawl lifecycle and its cancellation flag
//! - `HostState`: per-host politeness timing and robots.txt cache

mod crawl_status;
mod host_state;

// Re-export main types
pub use crawl_status::{CrawlControl, CrawlStatus};
pub use host_state::HostState;
