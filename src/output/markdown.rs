//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a harvest run.

use crate::output::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary to `output_path`
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Harvest Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Root**: {}\n", summary.root));
    md.push_str(&format!("- **Depth**: {}\n", summary.depth));
    md.push_str(&format!("- **Generated**: {}\n", summary.generated_at));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.stats.elapsed.as_secs_f64()
    ));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Page breakdown
    md.push_str("## Pages\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Downloaded | {} |\n", summary.stats.downloaded));
    md.push_str(&format!("| Listed (not downloaded) | {} |\n", summary.stats.listed));
    md.push_str(&format!("| Failed | {} |\n", summary.stats.failed));
    md.push_str(&format!("| Visited | {} |\n\n", summary.stats.visited));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    if summary.pages_formatted > 0 || summary.format_failures > 0 {
        md.push_str("## Markdown Formatting\n\n");
        md.push_str(&format!("- **Formatted**: {}\n", summary.pages_formatted));
        md.push_str(&format!("- **Failed**: {}\n\n", summary.format_failures));
    }

    if !summary.domains.is_empty() {
        md.push_str("## Domains\n\n");
        for domain in &summary.domains {
            md.push_str(&format!("- {}\n", domain));
        }
        md.push('\n');
    }

    md
}
