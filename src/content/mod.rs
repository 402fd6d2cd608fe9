//! Content cleaning
//!
//! Turns raw page HTML into canonical content: noise removed, attributes
//! restricted to an allow-list, empty containers dropped, and whitespace
//! normalized so repeated cleaning gives identical output.

mod cleaner;
mod noise;

pub use cleaner::{HtmlCleaner, MAX_NESTING_DEPTH};
pub(crate) use cleaner::escape_text;
pub use noise::{is_media, is_noise};

use thiserror::Error;

/// A cleaned page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPage {
    /// Document title, if the page had a non-empty `<title>`
    pub title: Option<String>,

    /// Canonical body HTML, headed by the title as `<h1>`
    pub html: String,
}

/// Options controlling what survives cleaning
#[derive(Debug, Clone)]
pub struct CleanerOptions {
    /// Attributes kept on surviving elements, in output order
    pub allowed_attributes: Vec<String>,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self {
            allowed_attributes: ["href", "src", "alt", "title", "width", "height"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Errors raised while cleaning a page
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("Document nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
}
