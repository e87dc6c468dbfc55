//! Configures a crawl with the builder and writes a markdown report
//!
//! ```text
//! cargo run --example builder -- https://example.com summary.md
//! ```

use arachne::output::write_markdown_summary;
use arachne::Website;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arachne=debug,info")),
        )
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "https://choosealicense.com".to_string());
    let report = args.next().map(PathBuf::from);

    let website = Website::new(&url)
        .with_user_agent("BotBot")
        .with_headers([("authorization", "Bearer token")])
        .with_budget([("*", 50), ("/licenses", 10)])
        .with_subdomains(true)
        .with_respect_robots_txt(true)
        .with_delay(Duration::from_millis(100))
        .with_max_concurrency(8)
        .with_blacklist_url([r"\.pdf$"]);

    let summary = website.crawl().await?;
    let links = website.get_links();
    println!("{} links, {}", links.len(), summary);

    if let Some(path) = report {
        write_markdown_summary(&path, &url, &summary, &links)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}
