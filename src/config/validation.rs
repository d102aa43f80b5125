use crate::config::types::{
    ClassifyConfig, Config, CrawlerConfig, OutputConfig, ProxyConfig, ScopeConfig,
    SessionPolicy, StructureConfig,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
///
/// Any failure here is fatal: it is reported before a single page is fetched.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_scope_config(&config.scope)?;
    validate_classify_config(&config.classify)?;
    validate_proxy_config(&config.proxy)?;
    validate_structure_config(&config.structure)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.start_urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one start URL is required".to_string(),
        ));
    }

    for start in &config.start_urls {
        let url = Url::parse(start).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Start URL '{}' must use an HTTP or HTTPS scheme",
                start
            )));
        }
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates scope filters
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    for pattern in config.allow.iter().chain(config.deny.iter()) {
        validate_regex(pattern)?;
    }

    if let Some(keep) = &config.keep_query_params {
        if keep.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "keep_query_params cannot contain empty names".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates classification patterns
fn validate_classify_config(config: &ClassifyConfig) -> Result<(), ConfigError> {
    validate_regex(&config.category_pattern)?;
    validate_regex(&config.product_pattern)?;
    Ok(())
}

/// Validates the proxy pool and rotation policy
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.session_policy == SessionPolicy::Rotating && config.rotate_every < 1 {
        return Err(ConfigError::Validation(format!(
            "rotate_every must be >= 1 for a rotating session policy, got {}",
            config.rotate_every
        )));
    }

    for entry in &config.pool {
        Url::parse(&entry.server).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy server '{}': {}", entry.server, e))
        })?;

        if entry.password.is_some() && entry.username.is_none() {
            return Err(ConfigError::Validation(format!(
                "Proxy '{}' has a password but no username",
                entry.server
            )));
        }
    }

    Ok(())
}

/// Validates structure detection limits
fn validate_structure_config(config: &StructureConfig) -> Result<(), ConfigError> {
    let limits = [
        ("probe_category_limit", config.probe_category_limit),
        ("products_per_category", config.products_per_category),
        ("global_product_cap", config.global_product_cap),
        ("pagination_max_pages", config.pagination_max_pages),
    ];

    for (name, value) in limits {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a pattern compiles as a regex
fn validate_regex(pattern: &str) -> Result<(), ConfigError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}
