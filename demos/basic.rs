//! Crawls a site and prints every visited link
//!
//! ```text
//! cargo run --example basic -- https://example.com
//! ```

use arachne::Website;
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

    let website = Website::new(&url);
    let summary = website.crawl().await?;

    for link in website.get_links() {
        println!("{}", link);
    }
    println!("{}", summary);

    Ok(())
}
