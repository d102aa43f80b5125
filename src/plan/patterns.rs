//! Grouped filter expressions built from plan inventories

use std::collections::BTreeSet;
use url::Url;

/// Above this many distinct basenames the grouped expression gets unwieldy
pub const MAX_GROUP_BASENAMES: usize = 40;

/// Broad fallback: numeric-suffixed `.html` paths
pub const GENERIC_PAGE_PATTERN: &str = r"/[^/]*\d+\.html$";

/// Last non-empty path segment of a URL
pub fn path_basename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(String::from)
}

/// Builds one alternation over the distinct path basenames of `urls`
///
/// Returns `None` when there is nothing to group, and the generic pattern when
/// there are more than [`MAX_GROUP_BASENAMES`] distinct basenames.
///
/// # Examples
///
/// ```
/// use sumi_sweep::plan::build_group_pattern;
///
/// let urls = vec![
///     "https://shop.test/catalog-shoes".to_string(),
///     "https://shop.test/catalog-bags".to_string(),
/// ];
/// assert_eq!(
///     build_group_pattern(&urls).as_deref(),
///     Some(r"/(?:catalog\-bags|catalog\-shoes)(?:/|$)")
/// );
/// ```
pub fn build_group_pattern(urls: &[String]) -> Option<String> {
    let basenames: BTreeSet<String> = urls.iter().filter_map(|u| path_basename(u)).collect();

    if basenames.is_empty() {
        return None;
    }

    if basenames.len() > MAX_GROUP_BASENAMES {
        return Some(GENERIC_PAGE_PATTERN.to_string());
    }

    let alternation = basenames
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");

    Some(format!("/(?:{})(?:/|$)", alternation))
}
