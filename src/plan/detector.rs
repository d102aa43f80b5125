//! Structure detection probe
//!
//! Samples the root page and a bounded set of categories to build the category
//! and product inventory of a site. Every render failure degrades to an empty
//! page; only a missing start URL fails the probe.

use crate::config::{ScopeConfig, StructureConfig};
use crate::plan::pagination::{derive_pattern, is_page_two, page_url};
use crate::plan::patterns::build_group_pattern;
use crate::plan::{CategorySignals, PaginationHint, Plan};
use crate::render::{RenderedPage, Renderer};
use crate::url::{normalize, normalize_url, ClassificationTag, Classifier, NormalizeOptions};
use crate::ConfigError;
use chrono::Utc;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Bounds on how much of the site the probe touches
#[derive(Debug, Clone)]
pub struct ProbeLimits {
    pub probe_category_limit: usize,
    pub products_per_category: usize,
    pub global_product_cap: usize,
    pub pagination_max_pages: u32,
    pub probe_timeout: Duration,
}

impl ProbeLimits {
    pub fn from_config(config: &StructureConfig) -> Self {
        Self {
            probe_category_limit: config.probe_category_limit as usize,
            products_per_category: config.products_per_category as usize,
            global_product_cap: config.global_product_cap as usize,
            pagination_max_pages: config.pagination_max_pages,
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
        }
    }
}

fn price_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:[$€£¥]\s?\d[\d.,]*)|(?:\b(?:usd|eur|gbp|jpy)\s?\d[\d.,]*)|(?:\d[\d.,]*\s?(?:[$€£¥]|\b(?:usd|eur|gbp|jpy)\b))",
        )
        .expect("price token pattern is valid")
    })
}

/// Counts price-like tokens in page markup
pub fn count_price_tokens(markup: &str) -> usize {
    price_token_regex().find_iter(markup).count()
}

/// Counts JSON-LD entities typed `Product`
///
/// Looks at `@type` directly, inside `@type` arrays, and through `@graph` and
/// top-level arrays. Blocks that do not parse fall back to a substring check.
pub fn count_structured_products(blocks: &[String]) -> usize {
    blocks
        .iter()
        .map(|block| match serde_json::from_str::<Value>(block) {
            Ok(value) => count_products_in(&value),
            Err(_) => usize::from(block.contains("\"Product\"")),
        })
        .sum()
}

fn count_products_in(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.iter().map(count_products_in).sum(),
        Value::Object(map) => {
            let own = match map.get("@type") {
                Some(Value::String(t)) => usize::from(t == "Product"),
                Some(Value::Array(types)) => {
                    usize::from(types.iter().any(|t| t.as_str() == Some("Product")))
                }
                _ => 0,
            };
            own + map.get("@graph").map(count_products_in).unwrap_or(0)
        }
        _ => 0,
    }
}

/// Probes a site and builds its [`Plan`]
///
/// # Algorithm
///
/// 1. Render the root and classify its in-scope links; categories are sorted
///    and truncated to the probe limit
/// 2. For each category until the global cap is reached, render it, record
///    diagnostic signals and select its first products in lexicographic order
/// 3. Follow a derivable pagination template through synthesized pages until
///    the category bucket is full
/// 4. Group category and product basenames into filter expressions
/// 5. Hash (root, categories, products)
///
/// # Errors
///
/// Returns a configuration error when `start_urls` is empty or the first start
/// URL cannot be normalized.
pub async fn detect_structure<R>(
    renderer: &R,
    start_urls: &[String],
    limits: &ProbeLimits,
    scope: &ScopeConfig,
    classifier: &Classifier,
) -> crate::Result<Plan>
where
    R: Renderer + ?Sized,
{
    let first = start_urls.first().ok_or_else(|| {
        ConfigError::Validation("structure detection needs at least one start URL".to_string())
    })?;
    let root = normalize_url(first, None, &NormalizeOptions::default())
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", first, e)))?;
    let options = NormalizeOptions::from_config(scope, &root);

    info!("Probing site structure from {}", root);

    let root_page = render_or_empty(renderer, &root, limits.probe_timeout).await;
    let mut seen = HashSet::new();
    let mut category_set = BTreeSet::new();
    let mut root_products = 0usize;

    for href in &root_page.outbound_hrefs {
        let Some(link) = normalize(href, Some(&root), &options) else {
            continue;
        };
        if link == root || !seen.insert(link.to_string()) {
            continue;
        }
        match classifier.classify(&link) {
            ClassificationTag::Category => {
                category_set.insert(link.to_string());
            }
            ClassificationTag::Product => root_products += 1,
            ClassificationTag::Normal => {}
        }
    }

    let mut categories: Vec<String> = category_set.into_iter().collect();
    categories.truncate(limits.probe_category_limit);
    debug!(
        "Root exposes {} categories (after limit) and {} products",
        categories.len(),
        root_products
    );

    let mut inventory = Inventory::new(limits);
    let mut pagination = BTreeMap::new();
    let mut signals = BTreeMap::new();

    for category in &categories {
        if inventory.global_full() {
            debug!("Global product cap reached, skipping remaining categories");
            break;
        }

        let Ok(category_url) = Url::parse(category) else {
            continue;
        };
        let page = render_or_empty(renderer, &category_url, limits.probe_timeout).await;

        let mut category_signals = CategorySignals::default();
        category_signals.record(&page);

        let products = select_products(&page, &category_url, &options, classifier);
        inventory.merge(category, products);

        if let Some(hint) = find_pagination(&page, &category_url, &options) {
            for n in 2..=limits.pagination_max_pages {
                if inventory.bucket_full(category) || inventory.global_full() {
                    break;
                }
                let Some(page_n) = page_url(&hint.pattern_hint, n) else {
                    break;
                };
                match renderer.render(&page_n, limits.probe_timeout).await {
                    Ok(page) => {
                        category_signals.record(&page);
                        let products = select_products(&page, &page_n, &options, classifier);
                        inventory.merge(category, products);
                    }
                    Err(e) => warn!("Skipping pagination page {}: {}", page_n, e),
                }
            }
            pagination.insert(category.clone(), hint);
        }

        signals.insert(category.clone(), category_signals);
    }

    let Inventory {
        category_products,
        product_list,
        ..
    } = inventory;

    let category_regex = build_group_pattern(&categories)
        .unwrap_or_else(|| classifier.category_pattern().to_string());
    let product_regex = build_group_pattern(&product_list)
        .unwrap_or_else(|| classifier.product_pattern().to_string());

    let root = root.to_string();
    let hash = Plan::compute_hash(&root, &categories, &product_list);

    info!(
        "Structure detected: {} categories, {} products, {} paginated",
        categories.len(),
        product_list.len(),
        pagination.len()
    );

    Ok(Plan {
        root,
        categories,
        category_products,
        product_list,
        pagination,
        category_regex,
        product_regex,
        hash,
        generated_at: Utc::now(),
        signals,
    })
}

impl CategorySignals {
    fn record(&mut self, page: &RenderedPage) {
        self.pages_probed += 1;
        self.price_tokens += count_price_tokens(&page.markup);
        self.structured_products += count_structured_products(&page.structured_data_blocks);
    }
}

/// Category buckets plus the capped global product list
struct Inventory {
    per_category: usize,
    global_cap: usize,
    category_products: BTreeMap<String, Vec<String>>,
    product_list: Vec<String>,
    listed: HashSet<String>,
}

impl Inventory {
    fn new(limits: &ProbeLimits) -> Self {
        Self {
            per_category: limits.products_per_category,
            global_cap: limits.global_product_cap,
            category_products: BTreeMap::new(),
            product_list: Vec::new(),
            listed: HashSet::new(),
        }
    }

    fn global_full(&self) -> bool {
        self.product_list.len() >= self.global_cap
    }

    fn bucket_full(&self, category: &str) -> bool {
        self.category_products
            .get(category)
            .map(|bucket| bucket.len() >= self.per_category)
            .unwrap_or(false)
    }

    /// Adds products to a category bucket
    ///
    /// A product enters a bucket only if it is already listed globally or the
    /// global list still has room, so the buckets' union is the global list.
    fn merge(&mut self, category: &str, products: Vec<String>) {
        let bucket = self.category_products.entry(category.to_string()).or_default();

        for product in products {
            if bucket.len() >= self.per_category {
                break;
            }
            if bucket.contains(&product) {
                continue;
            }
            if self.listed.contains(&product) {
                bucket.push(product);
            } else if self.product_list.len() < self.global_cap {
                self.listed.insert(product.clone());
                self.product_list.push(product.clone());
                bucket.push(product);
            }
        }
    }
}

/// Product links of a page, normalized, deduplicated and sorted
fn select_products(
    page: &RenderedPage,
    base: &Url,
    options: &NormalizeOptions,
    classifier: &Classifier,
) -> Vec<String> {
    let products: BTreeSet<String> = page
        .outbound_hrefs
        .iter()
        .filter_map(|href| normalize(href, Some(base), options))
        .filter(|link| classifier.classify(link) == ClassificationTag::Product)
        .map(|link| link.to_string())
        .collect();
    products.into_iter().collect()
}

/// First pagination hint with a page-2 shape and a derivable template
fn find_pagination(
    page: &RenderedPage,
    category: &Url,
    options: &NormalizeOptions,
) -> Option<PaginationHint> {
    page.pagination_hints.iter().find_map(|hint| {
        // The page parameter must survive whatever query policy the crawl uses
        let mut page2 = category.join(hint).ok()?;
        page2.set_fragment(None);
        if normalize(hint, Some(category), options).as_ref() != Some(&page2) {
            debug!("Pagination hint {} is not kept by the query policy", page2);
        }
        if !is_page_two(page2.as_str()) {
            return None;
        }
        let pattern_hint = derive_pattern(category, &page2)?;
        Some(PaginationHint {
            first_page: category.to_string(),
            page2: page2.to_string(),
            pattern_hint,
        })
    })
}

async fn render_or_empty<R>(renderer: &R, url: &Url, timeout: Duration) -> RenderedPage
where
    R: Renderer + ?Sized,
{
    match renderer.render(url, timeout).await {
        Ok(page) => page,
        Err(e) => {
            warn!("Probe render failed for {}: {}", url, e);
            RenderedPage::default()
        }
    }
}
