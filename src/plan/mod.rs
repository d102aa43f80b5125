//! Structure detection and crawl plans
//!
//! A [`Plan`] is the deterministic output of probing a site: which pages are
//! categories, which products they list, how each category paginates, and the
//! grouped expressions that recognize both. Plans are produced once per run (or
//! reused from a per-host profile) and are read-only input to the crawler.

mod detector;
mod pagination;
mod patterns;
mod profile;

pub use detector::{
    count_price_tokens, count_structured_products, detect_structure, ProbeLimits,
};
pub use pagination::{derive_pattern, is_page_two, page_url, PAGE_PLACEHOLDER};
pub use patterns::{build_group_pattern, path_basename, GENERIC_PAGE_PATTERN, MAX_GROUP_BASENAMES};
pub use profile::{write_plan_file, ProfileStore, PLAN_FILE_NAME};

use crate::config::Config;
use crate::render::Renderer;
use crate::url::{extract_domain, Classifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// How one category paginates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationHint {
    pub first_page: String,
    pub page2: String,
    /// Template containing [`PAGE_PLACEHOLDER`]
    pub pattern_hint: String,
}

/// Diagnostic counters gathered while probing one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySignals {
    pub price_tokens: usize,
    pub structured_products: usize,
    pub pages_probed: usize,
}

/// The persisted result of structure detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub root: String,
    /// Lexicographically ordered category URLs
    pub categories: Vec<String>,
    /// Products selected under each category, in discovery order
    pub category_products: BTreeMap<String, Vec<String>>,
    /// Deduplicated union of `category_products`, in discovery order
    pub product_list: Vec<String>,
    #[serde(default)]
    pub pagination: BTreeMap<String, PaginationHint>,
    pub category_regex: String,
    pub product_regex: String,
    pub hash: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub signals: BTreeMap<String, CategorySignals>,
}

impl Plan {
    /// Content fingerprint of (root, categories, products)
    ///
    /// Independent of `generated_at` and the diagnostic signals, so two probes of
    /// an unchanged site agree.
    pub fn compute_hash(root: &str, categories: &[String], products: &[String]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(root.as_bytes());
        for category in categories {
            hasher.update(b"\n");
            hasher.update(category.as_bytes());
        }
        // Separates the two lists so moving a URL between them changes the hash
        hasher.update(b"\n--\n");
        for product in products {
            hasher.update(product.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }

    /// Whether the stored hash matches the content
    pub fn verify_hash(&self) -> bool {
        self.hash == Self::compute_hash(&self.root, &self.categories, &self.product_list)
    }

    /// Host of the plan root, used as the profile key
    pub fn host(&self) -> Option<String> {
        ::url::Url::parse(&self.root)
            .ok()
            .and_then(|u| extract_domain(&u))
    }

    /// The category a plan product was selected under
    pub fn origin_category(&self, product: &str) -> Option<&str> {
        self.category_products
            .iter()
            .find(|(_, products)| products.iter().any(|p| p == product))
            .map(|(category, _)| category.as_str())
    }
}

/// Produces the plan for a run: reuses a cached profile or probes the site
///
/// The plan is persisted to `_crawl/plan.json` and the host profile. Persistence
/// failures are logged and the in-memory plan is still returned.
pub async fn prepare_plan<R>(
    config: &Config,
    renderer: &R,
    force_rebuild: bool,
) -> crate::Result<Plan>
where
    R: Renderer + ?Sized,
{
    let store = ProfileStore::new(config.profiles_dir());
    let host = config
        .crawler
        .start_urls
        .first()
        .and_then(|u| ::url::Url::parse(u).ok())
        .and_then(|u| extract_domain(&u));

    let rebuild = force_rebuild || config.structure.force_rebuild;
    let cached = match &host {
        Some(host) if config.structure.reuse_profile && !rebuild => store.load(host),
        _ => None,
    };

    let plan = match cached {
        Some(plan) => {
            info!(
                "Reusing cached profile for {} ({} categories, {} products)",
                plan.root,
                plan.categories.len(),
                plan.product_list.len()
            );
            plan
        }
        None => {
            let classifier = Classifier::new(
                &config.classify.category_pattern,
                &config.classify.product_pattern,
            )?;
            let limits = ProbeLimits::from_config(&config.structure);
            detect_structure(
                renderer,
                &config.crawler.start_urls,
                &limits,
                &config.scope,
                &classifier,
            )
            .await?
        }
    };

    if let Err(e) = write_plan_file(&config.crawl_dir(), &plan) {
        warn!("{}", e);
    }
    if let Some(host) = plan.host() {
        if let Err(e) = store.save(&host, &plan) {
            warn!("{}", e);
        }
    }

    Ok(plan)
}
