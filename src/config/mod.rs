//! Configuration module for Sumi-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! with `SUMI_SWEEP_*` environment variables layered on top.
//!
//! # Example
//!
//! ```no_run
//! use sumi_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifyConfig, Config, CrawlerConfig, OutputConfig, ProxyConfig, ProxyEntry, ScopeConfig,
    SessionPolicy, StructureConfig, TimingConfig, UserAgentConfig, DEFAULT_CATEGORY_PATTERN,
    DEFAULT_PRODUCT_PATTERN,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
