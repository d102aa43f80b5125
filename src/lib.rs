//! Sumi-Sweep: a plan-driven site sweeper
//!
//! This crate discovers, classifies and schedules the pages of a single site for
//! full-site capture. A structure-detection probe infers the site's category/product
//! taxonomy and pagination scheme into a deterministic plan; a breadth-first crawl
//! engine then consumes that plan (or falls back to plain BFS) under page, depth and
//! per-category quota limits.

pub mod config;
pub mod crawler;
pub mod output;
pub mod plan;
pub mod render;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Failed to persist {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
///
/// These never abort a run: callers that only need a yes/no answer go through
/// [`url::normalize`], which folds every variant into `None`.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Host out of scope: {0}")]
    OutOfScope(String),
}

/// Result type alias for Sumi-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome};
pub use plan::Plan;
pub use render::{RenderedPage, Renderer};
pub use state::{RunPhase, VisitRecord};
pub use url::{classify, normalize, normalize_url, ClassificationTag};
