use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Prefix shared by every environment override
const ENV_PREFIX: &str = "SUMI_SWEEP_";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides (`SUMI_SWEEP_*`) are applied after parsing and before
/// validation, so a config file may leave `start-urls` empty and rely on
/// `SUMI_SWEEP_START_URLS`.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_sweep::config::load_config;
///
/// let config = load_config(Path::new("sweep.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Parses TOML content into a configuration without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Applies `SUMI_SWEEP_*` overrides using the given variable lookup
///
/// Recognised variables: `START_URLS` (comma-separated), `OUTPUT_DIR`, `MAX_PAGES`,
/// `MAX_DEPTH`, `DETERMINISTIC`, `STRUCTURE`, `FORCE_REBUILD`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

    if let Some(urls) = var("START_URLS") {
        config.crawler.start_urls = urls
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(dir) = var("OUTPUT_DIR") {
        config.output.directory = PathBuf::from(dir);
    }
    if let Some(value) = var("MAX_PAGES") {
        config.crawler.max_pages = parse_number("MAX_PAGES", &value)?;
    }
    if let Some(value) = var("MAX_DEPTH") {
        config.crawler.max_depth = parse_number("MAX_DEPTH", &value)?;
    }
    if let Some(value) = var("DETERMINISTIC") {
        config.crawler.deterministic = parse_flag(&value);
    }
    if let Some(value) = var("STRUCTURE") {
        config.structure.enabled = parse_flag(&value);
    }
    if let Some(value) = var("FORCE_REBUILD") {
        config.structure.force_rebuild = parse_flag(&value);
    }

    Ok(())
}

fn parse_number(name: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::Validation(format!(
            "{}{} must be a non-negative integer, got '{}'",
            ENV_PREFIX, name, value
        ))
    })
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is recorded in the run report so runs can be matched to the config they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[crawler]
start-urls = ["https://shop.test/"]

[output]
directory = "./capture"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.start_urls, vec!["https://shop.test/"]);
        assert_eq!(config.crawler.max_pages, 500);
        assert_eq!(config.crawler.max_depth, 3);
        assert!(config.scope.same_host_only);
        assert!(!config.structure.enabled);
        assert_eq!(config.structure.products_per_category, 10);
        assert_eq!(config.crawl_dir(), PathBuf::from("./capture/_crawl"));
        assert_eq!(config.profiles_dir(), PathBuf::from("./capture/_profiles"));
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
[crawler]
start-urls = ["https://shop.test/"]
max-pages = 40
max-depth = 2
deterministic = true

[scope]
include-subdomains = true
deny = ["/cart"]
keep-query-params = ["page"]

[timing]
navigation-timeout-ms = 5000

[proxy]
session-policy = "rotating"
rotate-every = 3

[[proxy.pool]]
server = "http://proxy-a.test:8080"
username = "user"
password = "secret"

[structure]
enabled = true
global-product-cap = 50

[output]
directory = "/tmp/capture"
"#;
        let file = create_temp_config(content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_pages, 40);
        assert!(config.crawler.deterministic);
        assert!(config.scope.include_subdomains);
        assert_eq!(config.scope.keep_query_params, Some(vec!["page".to_string()]));
        assert_eq!(config.proxy.session_policy, crate::config::SessionPolicy::Rotating);
        assert_eq!(config.proxy.pool.len(), 1);
        assert_eq!(config.structure.global_product_cap, 50);
        assert_eq!(config.timing.navigation_timeout_ms, 5000);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/sweep.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = parse_config(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = [
            ("SUMI_SWEEP_START_URLS", "https://a.test/, https://b.test/"),
            ("SUMI_SWEEP_MAX_PAGES", "7"),
            ("SUMI_SWEEP_DETERMINISTIC", "yes"),
            ("SUMI_SWEEP_OUTPUT_DIR", "/tmp/out"),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(
            config.crawler.start_urls,
            vec!["https://a.test/", "https://b.test/"]
        );
        assert_eq!(config.crawler.max_pages, 7);
        assert!(config.crawler.deterministic);
        assert_eq!(config.output.directory, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = parse_config(MINIMAL).unwrap();
        let result = apply_env_overrides(&mut config, |key| {
            (key == "SUMI_SWEEP_MAX_DEPTH").then(|| "deep".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config(MINIMAL);

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
