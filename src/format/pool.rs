//! Bounded, retrying access to a Markdown formatter
//!
//! One pool is built per application run and handed to whoever needs
//! formatting. It caps formatting requests in flight and retries failures.

use crate::config::{FormatterConfig, ImageMode};
use crate::crawler::{ConcurrencyLimiter, CrawlResult, RetryPolicy};
use crate::format::{prepare_images, ChatCompletionsFormatter, FormatError, MarkdownFormatter};
use crate::url::Address;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared entry point to a formatter
#[derive(Clone)]
pub struct FormatterPool {
    formatter: Arc<dyn MarkdownFormatter>,
    limiter: ConcurrencyLimiter,
    policy: RetryPolicy,
    images: ImageMode,
}

impl FormatterPool {
    /// Creates a pool over `formatter`
    ///
    /// # Arguments
    ///
    /// * `formatter` - Performs single formatting attempts
    /// * `max_concurrent` - Maximum requests in flight
    /// * `policy` - Delays between failed attempts
    pub fn new(formatter: Arc<dyn MarkdownFormatter>, max_concurrent: usize, policy: RetryPolicy) -> Self {
        Self {
            formatter,
            limiter: ConcurrencyLimiter::new(max_concurrent),
            policy,
            images: ImageMode::Keep,
        }
    }

    /// Sets how images are treated before formatting
    pub fn with_images(mut self, images: ImageMode) -> Self {
        self.images = images;
        self
    }

    /// Builds a pool over the chat-completions formatter
    pub fn from_config(config: &FormatterConfig) -> Result<Self, FormatError> {
        let formatter = ChatCompletionsFormatter::from_env(config)?;
        Ok(Self::new(
            Arc::new(formatter),
            config.max_concurrent as usize,
            RetryPolicy::from_millis(&config.retry_delays_ms),
        )
        .with_images(config.images))
    }

    /// Formats one cleaned page
    ///
    /// A request slot is held only while an attempt is in flight, not while
    /// waiting to retry.
    pub async fn format(&self, html: &str) -> Result<String, FormatError> {
        let prepared = prepare_images(html, self.images);
        let html: &str = &prepared;
        let limiter = &self.limiter;
        let formatter = &self.formatter;

        self.policy
            .run("Markdown formatting", move || async move {
                let _permit = limiter.acquire().await;
                formatter.to_markdown(html).await
            })
            .await
    }

    /// Formats every downloaded page of a crawl
    ///
    /// Discovered-only entries are skipped. Each page gets its own outcome so
    /// one failure does not hide the rest.
    pub async fn format_all(&self, result: &CrawlResult) -> BTreeMap<Address, Result<String, FormatError>> {
        let jobs = result.downloaded().map(move |(address, html)| async move {
            tracing::debug!("Formatting {}", address);
            let formatted = self.format(html).await;
            if let Err(e) = &formatted {
                tracing::warn!("Formatting {} failed: {}", address, e);
            }
            (address.clone(), formatted)
        });

        join_all(jobs).await.into_iter().collect()
    }
}

impl std::fmt::Debug for FormatterPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterPool")
            .field("max_concurrent", &self.limiter.capacity())
            .field("policy", &self.policy)
            .field("images", &self.images)
            .finish()
    }
}
