//! Console statistics for a finished crawl

use crate::crawler::CrawlStats;

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Addresses visited: {}", stats.visited);
    println!("  Pages downloaded: {}", stats.downloaded);
    println!("  Links listed (not downloaded): {}", stats.listed);
    println!("  Pages failed: {}", stats.failed);
    println!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully fetched)",
        success_rate(stats),
        stats.downloaded,
        stats.downloaded + stats.failed
    );
}

/// Share of fetch attempts that produced content, as a percentage
pub fn success_rate(stats: &CrawlStats) -> f64 {
    let attempted = stats.downloaded + stats.failed;
    if attempted == 0 {
        return 0.0;
    }
    (stats.downloaded as f64 / attempted as f64) * 100.0
}
