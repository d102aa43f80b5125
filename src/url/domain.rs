use url::Url;

/// The host a crawl is anchored to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostScope {
    /// Lowercase host of the root URL
    pub root_host: String,
    /// Whether subdomains of the root host are in scope
    pub include_subdomains: bool,
}

/// Extracts the domain from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_sweep::url::extract_domain;
///
/// let url = Url::parse("https://SHOP.test/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.test".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Strips a leading `www.` so `www.shop.test` and `shop.test` compare equal
pub fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Checks a lowercase host against a scope
///
/// The bare root host always matches; with `include_subdomains` any host below it
/// matches too.
pub fn host_in_scope(host: &str, scope: &HostScope) -> bool {
    let host = bare_host(host);
    let root = bare_host(&scope.root_host);

    host == root || (scope.include_subdomains && host.ends_with(&format!(".{}", root)))
}
