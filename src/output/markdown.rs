//! Markdown report of a finished crawl

use crate::output::summary::CrawlSummary;
use std::io::Write;
use std::path::Path;

/// Formats a crawl summary and its visited links as markdown
///
/// # Arguments
///
/// * `seed` - The URL the crawl started from
/// * `summary` - The crawl summary
/// * `links` - Visited links, in completion order
pub fn format_markdown_summary(seed: &str, summary: &CrawlSummary, links: &[String]) -> String {
    let mut md = String::new();

    md.push_str("# Arachne Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", seed));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.elapsed.as_secs_f64()
    ));
    md.push_str(&format!(
        "- **Status**: {}{}\n\n",
        summary.status,
        if summary.stopped { " (stopped)" } else { "" }
    ));

    md.push_str("## Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages visited | {} |\n", summary.pages_visited));
    md.push_str(&format!("| Pages failed | {} |\n", summary.pages_failed));
    md.push_str(&format!(
        "| Links discovered | {} |\n",
        summary.links_discovered
    ));
    md.push_str(&format!("| Over budget | {} |\n", summary.budget_rejected));
    md.push_str(&format!(
        "| Blocked by robots.txt | {} |\n",
        summary.robots_rejected
    ));
    md.push_str(&format!(
        "| Success rate | {:.2}% |\n\n",
        summary.success_rate()
    ));

    if !summary.issues.is_empty() {
        md.push_str("## Issues\n\n");
        for issue in &summary.issues {
            md.push_str(&format!("- `{}` {}\n", issue.url, issue));
        }
        md.push('\n');
    }

    md.push_str("## Visited Links\n\n");
    if links.is_empty() {
        md.push_str("_No pages were visited._\n");
    }
    for link in links {
        md.push_str(&format!("- {}\n", link));
    }

    md
}

/// Writes the markdown report to `output_path`
pub fn write_markdown_summary(
    output_path: &Path,
    seed: &str,
    summary: &CrawlSummary,
    links: &[String],
) -> std::io::Result<()> {
    let markdown = format_markdown_summary(seed, summary, links);
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(markdown.as_bytes())
}
