use serde::Deserialize;
use std::path::PathBuf;

/// Default category-like path pattern
pub const DEFAULT_CATEGORY_PATTERN: &str =
    r"(?i)/(catalog|category|categories|collections?|departments?|shop)(?:[-_/]|$)";

/// Default product-like path pattern
pub const DEFAULT_PRODUCT_PATTERN: &str =
    r"(?i)(/(product|products|item|items|p)[-_/][^/]+|/[^/]*\d+\.html$)";

/// Main configuration structure for Sumi-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub structure: StructureConfig,
    pub output: OutputConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs the crawl (and the structure probe) starts from
    #[serde(rename = "start-urls", default)]
    pub start_urls: Vec<String>,

    /// Maximum number of pages to fetch
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum BFS depth from the seeds
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Fully re-sort the frontier before every dequeue
    #[serde(default)]
    pub deterministic: bool,

    /// Sentinel file that stops the run when it appears
    #[serde(rename = "stop-file", default)]
    pub stop_file: Option<PathBuf>,

    /// Continue from the checkpoint of a stopped run
    #[serde(default)]
    pub resume: bool,
}

/// Host scoping and link filtering
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    #[serde(rename = "same-host-only", default = "default_true")]
    pub same_host_only: bool,

    #[serde(rename = "include-subdomains", default)]
    pub include_subdomains: bool,

    /// Regexes a discovered link must match (any of) to be followed
    #[serde(default)]
    pub allow: Vec<String>,

    /// Regexes that reject a discovered link
    #[serde(default)]
    pub deny: Vec<String>,

    /// Query parameter names to retain; absent keeps the whole query
    #[serde(rename = "keep-query-params", default)]
    pub keep_query_params: Option<Vec<String>>,

    /// Drop every query string
    #[serde(rename = "strip-query", default)]
    pub strip_query: bool,
}

/// Category/product classification overrides
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyConfig {
    #[serde(rename = "category-pattern", default = "default_category_pattern")]
    pub category_pattern: String,

    #[serde(rename = "product-pattern", default = "default_product_pattern")]
    pub product_pattern: String,
}

/// Page load timing
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Time to wait after a page has loaded (milliseconds)
    #[serde(rename = "wait-after-load-ms", default)]
    pub wait_after_load_ms: u64,

    /// Navigation timeout for a single page (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_nav_timeout")]
    pub navigation_timeout_ms: u64,
}

/// Proxy/session selection policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPolicy {
    /// One identity for the whole run
    #[default]
    Stable,
    /// Advance the proxy pointer every `rotate-every` successful fetches
    Rotating,
}

/// Egress proxy pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub pool: Vec<ProxyEntry>,

    #[serde(rename = "session-policy", default)]
    pub session_policy: SessionPolicy,

    #[serde(rename = "rotate-every", default = "default_rotate_every")]
    pub rotate_every: u32,

    /// Append a `-session-<n>` suffix to the proxy username
    #[serde(rename = "session-suffix", default)]
    pub session_suffix: bool,
}

/// A single proxy in the pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyEntry {
    pub server: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Structure detection (probe) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StructureConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(rename = "probe-category-limit", default = "default_probe_category_limit")]
    pub probe_category_limit: u32,

    #[serde(rename = "products-per-category", default = "default_products_per_category")]
    pub products_per_category: u32,

    #[serde(rename = "global-product-cap", default = "default_global_product_cap")]
    pub global_product_cap: u32,

    #[serde(rename = "pagination-max-pages", default = "default_pagination_max_pages")]
    pub pagination_max_pages: u32,

    #[serde(rename = "probe-timeout-ms", default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    #[serde(rename = "reuse-profile", default = "default_true")]
    pub reuse_profile: bool,

    #[serde(rename = "force-rebuild", default)]
    pub force_rebuild: bool,

    #[serde(rename = "profiles-dir", default)]
    pub profiles_dir: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Run output location; artifacts land in its `_crawl` subdirectory
    pub directory: PathBuf,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Config {
    /// Directory holding the run artifacts
    pub fn crawl_dir(&self) -> PathBuf {
        self.output.directory.join("_crawl")
    }

    /// Directory holding per-host profiles
    pub fn profiles_dir(&self) -> PathBuf {
        self.structure
            .profiles_dir
            .clone()
            .unwrap_or_else(|| self.output.directory.join("_profiles"))
    }

    /// Path of the stop sentinel file
    pub fn stop_file(&self) -> PathBuf {
        self.crawler
            .stop_file
            .clone()
            .unwrap_or_else(|| self.crawl_dir().join("STOP"))
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            same_host_only: true,
            include_subdomains: false,
            allow: Vec::new(),
            deny: Vec::new(),
            keep_query_params: None,
            strip_query: false,
        }
    }
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            category_pattern: default_category_pattern(),
            product_pattern: default_product_pattern(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            wait_after_load_ms: 0,
            navigation_timeout_ms: default_nav_timeout(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            pool: Vec::new(),
            session_policy: SessionPolicy::Stable,
            rotate_every: default_rotate_every(),
            session_suffix: false,
        }
    }
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            probe_category_limit: default_probe_category_limit(),
            products_per_category: default_products_per_category(),
            global_product_cap: default_global_product_cap(),
            pagination_max_pages: default_pagination_max_pages(),
            probe_timeout_ms: default_probe_timeout(),
            reuse_profile: true,
            force_rebuild: false,
            profiles_dir: None,
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> u32 {
    500
}

fn default_max_depth() -> u32 {
    3
}

fn default_category_pattern() -> String {
    DEFAULT_CATEGORY_PATTERN.to_string()
}

fn default_product_pattern() -> String {
    DEFAULT_PRODUCT_PATTERN.to_string()
}

fn default_nav_timeout() -> u64 {
    30_000
}

fn default_rotate_every() -> u32 {
    10
}

fn default_probe_category_limit() -> u32 {
    20
}

fn default_products_per_category() -> u32 {
    10
}

fn default_global_product_cap() -> u32 {
    200
}

fn default_pagination_max_pages() -> u32 {
    5
}

fn default_probe_timeout() -> u64 {
    20_000
}

fn default_crawler_name() -> String {
    "SumiSweep".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
