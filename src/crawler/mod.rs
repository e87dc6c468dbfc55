//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`Fetcher`] trait
//! - HTML parsing and link extraction
//! - The frontier, the visited store and budget accounting
//! - Request scheduling, politeness and cancellation
//! - Delivery of finished pages to a subscriber

mod budget;
mod fetcher;
mod frontier;
mod page;
mod parser;
mod scheduler;
mod sink;
mod worker;

pub use budget::{BudgetController, BudgetPattern};
pub use fetcher::{
    build_http_client, FetchRequest, FetchResponse, Fetcher, HttpFetcher, DEFAULT_USER_AGENT,
    MAX_REDIRECTS,
};
pub use frontier::{Frontier, VisitedLinks};
pub use page::Page;
pub use parser::{extract_links, extract_title, HtmlLinkExtractor, LinkExtractor};
pub use scheduler::Scheduler;
pub use sink::{Subscriber, SubscriptionSink};
pub use worker::{process_page, PageContext, PageOutcome};
