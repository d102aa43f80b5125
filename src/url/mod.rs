//! URL handling module for Sumi-Sweep
//!
//! This module provides URL normalization, host scoping, allow/deny filtering
//! and category/product classification.

mod classify;
mod domain;
mod filter;
mod normalize;

// Re-export main functions
pub use classify::{classify, ClassificationTag, Classifier};
pub use domain::{bare_host, extract_domain, host_in_scope, HostScope};
pub use filter::UrlFilter;
pub use normalize::{normalize, normalize_url, NormalizeOptions, QueryPolicy};
