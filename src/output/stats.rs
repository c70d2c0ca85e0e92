//! Printing of end-of-run statistics

use crate::output::traits::CrawlSummary;

/// Renders the summary as the multi-line report printed by the CLI
pub fn format_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();
    out.push_str("=== Crawl Summary ===\n\n");
    out.push_str(&format!("Seed: {}\n", summary.seed_url));
    out.push_str(&format!(
        "Started: {}  Finished: {}  ({:.1}s)\n",
        summary.started_at, summary.finished_at, summary.duration_seconds
    ));
    if summary.cancelled {
        out.push_str("Run was stopped before the frontier was exhausted\n");
    }
    out.push('\n');

    out.push_str("Pages:\n");
    out.push_str(&format!("  Visited: {}\n", summary.pages_visited));
    out.push_str(&format!("  Fetched: {}\n", summary.pages_fetched));
    out.push_str(&format!("  Failed: {}\n", summary.pages_failed));
    out.push_str(&format!("  Left pending: {}\n", summary.pages_left_pending));
    out.push('\n');

    out.push_str("Products:\n");
    out.push_str(&format!("  Written: {}\n", summary.products_written));
    out.push_str(&format!(
        "  Product pages without data: {}\n",
        summary.product_pages_without_record
    ));
    out.push('\n');

    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} pages fetched), {:.2} pages/sec\n",
        summary.success_rate(),
        summary.pages_fetched,
        summary.pages_visited,
        summary.pages_per_second()
    ));
    out
}

/// Prints the summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    print!("{}", format_summary(summary));
}
