//! Crawler module for page retrieval and traversal
//!
//! This module contains the core crawling logic, including:
//! - Link extraction from raw page content
//! - Content retrieval with retry logic
//! - Fetch concurrency limiting
//! - Depth-bounded traversal

mod engine;
mod fetcher;
mod limiter;
mod links;
mod retry;

pub use engine::{CrawlResult, CrawlStats, Crawler, DISCOVERED_SENTINEL};
pub use fetcher::{
    build_http_client, format_user_agent, ContentSource, FetchError, HttpSource, RetrievalMode,
    RetryingFetcher,
};
pub use limiter::{ConcurrencyLimiter, FetchPermit};
pub use links::{extract_links, extract_title};
pub use retry::RetryPolicy;
