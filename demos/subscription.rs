//! Streams pages to a subscriber while the crawl runs
//!
//! ```text
//! cargo run --example subscription -- https://example.com
//! ```

use arachne::{CrawlOptions, Website};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arachne=info,warn")),
        )
        .with_target(false)
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://choosealicense.com".to_string());

    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);

    let website = Website::new(&url).with_slim_pages(true).with_return_page_links(true);
    website
        .crawl_with(CrawlOptions::new().subscribe(move |page| {
            let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
            println!(
                "{:>4} {} {} ({} links)",
                n,
                page.status_code,
                page.url,
                page.links.as_ref().map_or(0, Vec::len)
            );
            Ok(())
        }))
        .await?;

    println!("{} pages delivered", count.load(Ordering::Relaxed));
    Ok(())
}
