//! Output module for writing harvested pages and run summaries
//!
//! This module handles:
//! - Writing one file per downloaded page plus an index
//! - Generating markdown summaries of a run
//! - Printing crawl statistics to the console

mod markdown;
pub mod stats;
mod summary;
mod writer;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::print_statistics;
pub use summary::CrawlSummary;
pub use writer::{index_path, page_file_name, write_pages, MarkdownPages, WrittenEntry, INDEX_FILE};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
