//! URL handling module for Sumi-Harvest
//!
//! This module provides the normalized [`Address`] type, domain helpers with
//! wildcard matching, and the [`LinkScope`] filter applied to discovered links.

mod domain;
mod normalize;
mod scope;

// Re-export main types and functions
pub use domain::{extract_domain, matches_wildcard};
pub use normalize::Address;
pub use scope::LinkScope;
