//! Allow/deny filtering of discovered links

use crate::config::ScopeConfig;
use crate::ConfigError;
use regex::Regex;

/// Compiled allow/deny regexes
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

impl UrlFilter {
    pub fn from_config(config: &ScopeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            allow: compile_all(&config.allow)?,
            deny: compile_all(&config.deny)?,
        })
    }

    /// Deny patterns win; with no allow patterns everything else passes
    pub fn is_allowed(&self, url: &str) -> bool {
        if self.deny.iter().any(|pattern| pattern.is_match(url)) {
            return false;
        }

        self.allow.is_empty() || self.allow.iter().any(|pattern| pattern.is_match(url))
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p, e)))
        })
        .collect()
}
