use crate::config::ScopeConfig;
use crate::url::domain::{host_in_scope, HostScope};
use crate::UrlError;
use url::Url;

/// How the query string survives normalization
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryPolicy {
    /// Keep the query unmodified
    #[default]
    Keep,
    /// Drop every query string
    StripAll,
    /// Retain only the named parameters, in their original relative order
    Allow(Vec<String>),
}

/// Options that make normalization a pure function of (raw, base, options)
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Host scoping; `None` accepts any host
    pub scope: Option<HostScope>,
    pub query: QueryPolicy,
}

impl NormalizeOptions {
    /// Builds options from the scope configuration, anchored at `root`
    pub fn from_config(config: &ScopeConfig, root: &Url) -> Self {
        let scope = if config.same_host_only {
            root.host_str().map(|host| HostScope {
                root_host: host.to_lowercase(),
                include_subdomains: config.include_subdomains,
            })
        } else {
            None
        };

        let query = if config.strip_query {
            QueryPolicy::StripAll
        } else if let Some(keep) = &config.keep_query_params {
            QueryPolicy::Allow(keep.clone())
        } else {
            QueryPolicy::Keep
        };

        Self { scope, query }
    }
}

/// Normalizes a raw link into its canonical form
///
/// # Normalization Steps
///
/// 1. Resolve against `base` (if any); reject if not a resolvable absolute URL
/// 2. Reject non-HTTP(S) schemes and URLs without a host
/// 3. Apply host scoping (same-host only, optionally with subdomains)
/// 4. Normalize path:
///    - Remove dot segments and repeated slashes
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment
/// 6. Filter the query per [`QueryPolicy`]; an empty query is dropped
///
/// # Examples
///
/// ```
/// use sumi_sweep::url::{normalize_url, NormalizeOptions};
/// use url::Url;
///
/// let base = Url::parse("https://shop.test/catalog/").unwrap();
/// let url = normalize_url("../item-1.html#reviews", Some(&base), &NormalizeOptions::default()).unwrap();
/// assert_eq!(url.as_str(), "https://shop.test/item-1.html");
/// ```
pub fn normalize_url(
    raw: &str,
    base: Option<&Url>,
    options: &NormalizeOptions,
) -> Result<Url, UrlError> {
    let raw = raw.trim();

    // Step 1: Resolve
    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    // Step 2: Scheme and host
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();

    // Step 3: Host scoping
    if let Some(scope) = &options.scope {
        if !host_in_scope(&host, scope) {
            return Err(UrlError::OutOfScope(host));
        }
    }

    // Step 4: Path
    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    // Step 5: Fragment
    url.set_fragment(None);

    // Step 6: Query
    let query = url.query().map(|q| filter_query(q, &options.query));
    url.set_query(query.as_deref().filter(|q| !q.is_empty()));

    Ok(url)
}

/// Normalization that folds every failure into `None`
///
/// Failures are expected (off-site links, `mailto:` and friends) and are only
/// worth a debug line.
pub fn normalize(raw: &str, base: Option<&Url>, options: &NormalizeOptions) -> Option<Url> {
    match normalize_url(raw, base, options) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::trace!("Dropping link {}: {}", raw, e);
            None
        }
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Filters raw `key=value` segments, keeping their original encoding and order
fn filter_query(query: &str, policy: &QueryPolicy) -> String {
    match policy {
        QueryPolicy::Keep => query.to_string(),
        QueryPolicy::StripAll => String::new(),
        QueryPolicy::Allow(names) => query
            .split('&')
            .filter(|segment| {
                let key = segment.split('=').next().unwrap_or_default();
                names.iter().any(|name| name == key)
            })
            .collect::<Vec<_>>()
            .join("&"),
    }
}
