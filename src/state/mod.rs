//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `PageState`: The per-page state machine of one traversal
//! - `VisitedSet`: The claim-once set shared by all branches of one traversal

mod page_state;
mod visited;

// Re-export main types
pub use page_state::PageState;
pub use visited::VisitedSet;
