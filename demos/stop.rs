//! Stops a crawl from inside the subscriber, and a background crawl from outside
//!
//! ```text
//! cargo run --example stop -- https://example.com
//! ```

use arachne::{CrawlOptions, Website};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const STOP_AFTER: usize = 15;

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

    let website = Website::new(&url);
    let handle = website.clone();
    let count = Arc::new(AtomicUsize::new(0));

    let summary = website
        .crawl_with(CrawlOptions::new().subscribe(move |page| {
            let n = count.fetch_add(1, Ordering::Relaxed) + 1;
            println!("{} {}", n, page.url);
            if n == STOP_AFTER {
                handle.stop();
            }
            Ok(())
        }))
        .await?;
    println!("Stopped: {}, {} links", summary.stopped, website.size());

    let task = website.crawl_background(CrawlOptions::new())?;
    tokio::time::sleep(Duration::from_secs(2)).await;
    task.cancel();
    let summary = task.join().await?;
    println!("Background crawl: {}", summary);

    Ok(())
}
