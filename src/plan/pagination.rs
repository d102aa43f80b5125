//! Pagination pattern derivation
//!
//! Given a category URL and an observed "page 2" URL, infer a template with a
//! page-number placeholder that can synthesize any page of that category.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Placeholder substituted with the page number
pub const PAGE_PLACEHOLDER: &str = "{N}";

fn page_two_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:[?&](?:page|p)=2(?:[&#]|$))|(?:/page/2(?:[/?#]|$))")
            .expect("page-two pattern is valid")
    })
}

fn page_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/page/\d+(/|$)").expect("page segment pattern is valid"))
}

/// Checks whether a link has the shape of a "page 2" link
///
/// # Examples
///
/// ```
/// use sumi_sweep::plan::is_page_two;
///
/// assert!(is_page_two("https://x.test/cat?page=2"));
/// assert!(is_page_two("https://x.test/cat/page/2"));
/// assert!(is_page_two("https://x.test/cat?sort=asc&p=2"));
/// assert!(!is_page_two("https://x.test/cat?page=22"));
/// ```
pub fn is_page_two(href: &str) -> bool {
    page_two_regex().is_match(href)
}

/// Derives a pagination template from a category URL and its page-2 URL
///
/// Rules are tried in order and the first match wins:
/// 1. a `page` query parameter
/// 2. a `/page/<n>` path segment
/// 3. a `p` query parameter
///
/// Returns `None` when the origins differ or no rule matches.
///
/// # Examples
///
/// ```
/// use sumi_sweep::plan::derive_pattern;
/// use url::Url;
///
/// let category = Url::parse("https://x.test/cat").unwrap();
/// let page2 = Url::parse("https://x.test/cat?page=2").unwrap();
/// assert_eq!(derive_pattern(&category, &page2).as_deref(), Some("https://x.test/cat?page={N}"));
/// ```
pub fn derive_pattern(category: &Url, page2: &Url) -> Option<String> {
    if category.origin() != page2.origin() {
        return None;
    }

    let origin = page2.origin().ascii_serialization();
    let path = page2.path();
    let query = page2.query();

    if let Some(templated) = query.and_then(|q| template_query_param(q, "page")) {
        return Some(format!("{}{}?{}", origin, path, templated));
    }

    if page_segment_regex().is_match(path) {
        let templated_path = page_segment_regex()
            .replace(path, format!("/page/{}$1", PAGE_PLACEHOLDER).as_str())
            .into_owned();
        return Some(match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", origin, templated_path, q),
            _ => format!("{}{}", origin, templated_path),
        });
    }

    if let Some(templated) = query.and_then(|q| template_query_param(q, "p")) {
        return Some(format!("{}{}?{}", origin, path, templated));
    }

    None
}

/// Synthesizes the URL of page `n` from a template
pub fn page_url(template: &str, n: u32) -> Option<Url> {
    Url::parse(&template.replace(PAGE_PLACEHOLDER, &n.to_string())).ok()
}

/// Replaces the value of `name` in a raw query string with the placeholder
fn template_query_param(query: &str, name: &str) -> Option<String> {
    let mut found = false;
    let segments: Vec<String> = query
        .split('&')
        .map(|segment| {
            let key = segment.split('=').next().unwrap_or_default();
            if !found && key == name {
                found = true;
                format!("{}={}", name, PAGE_PLACEHOLDER)
            } else {
                segment.to_string()
            }
        })
        .collect();

    found.then(|| segments.join("&"))
}
