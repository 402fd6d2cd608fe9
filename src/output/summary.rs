//! Run summary data

use crate::crawler::{CrawlResult, CrawlStats};
use crate::output::stats::success_rate;
use crate::url::{extract_domain, Address};
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeSet;

/// Summary of one harvest run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub root: String,
    pub depth: u32,
    pub generated_at: String,
    pub config_hash: Option<String>,

    // Crawl statistics
    pub stats: CrawlStats,

    // Formatting outcome (zero when the formatter did not run)
    pub pages_formatted: u64,
    pub format_failures: u64,

    // Hosts seen among result entries
    pub domains: Vec<String>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a summary for a finished crawl, stamped with the current time
    pub fn from_crawl(root: &Address, depth: u32, result: &CrawlResult, stats: &CrawlStats) -> Self {
        let domains: BTreeSet<String> = result
            .iter()
            .filter_map(|(address, _)| extract_domain(address))
            .collect();

        Self {
            root: root.to_string(),
            depth,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            config_hash: None,
            stats: stats.clone(),
            pages_formatted: 0,
            format_failures: 0,
            domains: domains.into_iter().collect(),
        }
    }

    /// Records the config file hash
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Records how many pages were formatted and how many failed
    pub fn with_formatting(mut self, formatted: u64, failures: u64) -> Self {
        self.pages_formatted = formatted;
        self.format_failures = failures;
        self
    }

    /// Returns the share of fetch attempts that produced content, as a percentage
    pub fn success_rate(&self) -> f64 {
        success_rate(&self.stats)
    }
}
