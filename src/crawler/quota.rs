//! Product quota accounting
//!
//! Quotas bound how many product pages a run fetches, per owning category and
//! in total. Discarding an item is a scheduling decision, not an error.

use crate::config::StructureConfig;
use crate::crawler::frontier::FrontierItem;
use crate::url::ClassificationTag;
use std::collections::BTreeMap;

/// Product caps for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub per_category: u32,
    pub global: u32,
}

impl QuotaLimits {
    pub fn from_config(config: &StructureConfig) -> Self {
        Self {
            per_category: config.products_per_category,
            global: config.global_product_cap,
        }
    }
}

/// Why a product item was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    GlobalCap,
    CategoryCap(String),
}

/// Outcome of the quota gate for one dequeued item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Admit,
    Discard(DiscardReason),
}

/// Fetched product counts, owned by one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotaState {
    per_category: BTreeMap<String, u32>,
    global_products: u32,
}

impl QuotaState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores counts saved from an earlier run
    pub fn from_parts(per_category: BTreeMap<String, u32>, global_products: u32) -> Self {
        Self {
            per_category,
            global_products,
        }
    }

    /// Decides without recording anything
    ///
    /// Non-product items are always admitted. Products without an origin
    /// category are bounded by the global cap only.
    pub fn evaluate(&self, item: &FrontierItem, limits: &QuotaLimits) -> QuotaDecision {
        if item.tag != ClassificationTag::Product {
            return QuotaDecision::Admit;
        }

        if self.global_products >= limits.global {
            return QuotaDecision::Discard(DiscardReason::GlobalCap);
        }

        if let Some(category) = &item.origin_category {
            if self.category_count(category) >= limits.per_category {
                return QuotaDecision::Discard(DiscardReason::CategoryCap(category.clone()));
            }
        }

        QuotaDecision::Admit
    }

    /// Runs the gate and counts the item when a product is admitted
    pub fn try_admit(&mut self, item: &FrontierItem, limits: &QuotaLimits) -> QuotaDecision {
        let decision = self.evaluate(item, limits);
        if decision == QuotaDecision::Admit && item.tag == ClassificationTag::Product {
            self.global_products += 1;
            if let Some(category) = &item.origin_category {
                *self.per_category.entry(category.clone()).or_insert(0) += 1;
            }
        }
        decision
    }

    pub fn category_count(&self, category: &str) -> u32 {
        self.per_category.get(category).copied().unwrap_or(0)
    }

    pub fn global_products(&self) -> u32 {
        self.global_products
    }

    pub fn per_category(&self) -> &BTreeMap<String, u32> {
        &self.per_category
    }
}
