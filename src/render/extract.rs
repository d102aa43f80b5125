//! HTML extraction for rendered pages
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - Embedded JSON-LD structured-data blocks
//! - Pagination hints (rel="next" and page-2 shaped links)

use crate::plan::is_page_two;
use crate::render::RenderedPage;
use scraper::{Html, Selector};
use url::Url;

/// Links pulled out of a document, before any normalization
#[derive(Debug, Clone, Default)]
pub struct ExtractedLinks {
    pub links: Vec<String>,
    pub pagination_hints: Vec<String>,
}

/// Parses HTML content into a [`RenderedPage`]
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only anchors
///
/// Hrefs are resolved against `base_url` so the core sees absolute links.
///
/// # Example
///
/// ```
/// use sumi_sweep::render::extract_page;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/catalog-bags">Bags</a><a href="?page=2" rel="next">2</a></body></html>"#;
/// let base = Url::parse("https://shop.test/catalog-shoes").unwrap();
/// let page = extract_page(html, &base);
/// assert!(page.outbound_hrefs.contains(&"https://shop.test/catalog-bags".to_string()));
/// assert_eq!(page.pagination_hints, vec!["https://shop.test/catalog-shoes?page=2".to_string()]);
/// ```
pub fn extract_page(html: &str, base_url: &Url) -> RenderedPage {
    let document = Html::parse_document(html);
    let extracted = extract_links(&document, base_url);

    RenderedPage {
        outbound_hrefs: extracted.links,
        markup: html.to_string(),
        structured_data_blocks: extract_structured_data(&document),
        pagination_hints: extracted.pagination_hints,
    }
}

/// Extracts followable links and pagination hints from the document
fn extract_links(document: &Html, base_url: &Url) -> ExtractedLinks {
    let mut extracted = ExtractedLinks::default();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(absolute) = element.value().attr("href").and_then(|h| resolve_link(h, base_url))
            else {
                continue;
            };

            let rel_next = element
                .value()
                .attr("rel")
                .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("next")))
                .unwrap_or(false);

            if (rel_next || is_page_two(&absolute)) && !extracted.pagination_hints.contains(&absolute)
            {
                extracted.pagination_hints.push(absolute.clone());
            }
            extracted.links.push(absolute);
        }
    }

    if let Ok(next_selector) = Selector::parse("link[rel='next'][href]") {
        for element in document.select(&next_selector) {
            if let Some(absolute) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                if !extracted.pagination_hints.contains(&absolute) {
                    extracted.pagination_hints.push(absolute);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                extracted.links.push(absolute);
            }
        }
    }

    extracted
}

/// Collects the text of every JSON-LD script block
fn extract_structured_data(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|block| !block.is_empty())
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None for special schemes, data URIs, fragment-only anchors and
/// anything that does not resolve to HTTP(S).
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}
