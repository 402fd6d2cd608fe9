//! Markdown formatting of cleaned pages
//!
//! The formatter itself is an external service reached through the
//! [`MarkdownFormatter`] trait. [`FormatterPool`] adds bounded concurrency and
//! retries on top of any implementation.

mod chat;
mod images;
mod pool;

pub use chat::ChatCompletionsFormatter;
pub use images::{
    local_image_name, prepare_images, replace_with_descriptions, rewrite_to_local_names,
};
pub use pool::FormatterPool;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a Markdown formatter
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("API key variable {0} is not set")]
    MissingApiKey(String),

    #[error("Formatter request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Formatter returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Formatter returned no content")]
    EmptyResponse,

    #[error("Invalid formatter response: {0}")]
    InvalidResponse(String),
}

/// Turns cleaned HTML into Markdown
///
/// Implementations perform a single attempt; retries and concurrency limits
/// belong to [`FormatterPool`].
#[async_trait]
pub trait MarkdownFormatter: Send + Sync {
    async fn to_markdown(&self, html: &str) -> Result<String, FormatError>;
}
