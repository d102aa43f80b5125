//! Run report

use crate::config::Config;
use crate::crawler::{Coordinator, CrawlOutcome};
use crate::render::Renderer;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Limits the run was configured with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLimits {
    pub max_pages: u32,
    pub max_depth: u32,
    pub deterministic: bool,
    pub structure: bool,
    pub products_per_category: u32,
    pub global_product_cap: u32,
}

impl ReportLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_pages: config.crawler.max_pages,
            max_depth: config.crawler.max_depth,
            deterministic: config.crawler.deterministic,
            structure: config.structure.enabled,
            products_per_category: config.structure.products_per_category,
            global_product_cap: config.structure.global_product_cap,
        }
    }
}

/// Summary written to `report.json`
///
/// Always lists the crawled and discovered counts and whether the stop signal
/// ended the run, even when individual pages failed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub start_urls: Vec<String>,
    /// Every visit, successful or not
    pub pages_crawled: usize,
    pub pages_failed: usize,
    pub pages_discovered: usize,
    /// Lines in `urls.txt`
    pub seeds_for_downstream: usize,
    pub products_fetched: u32,
    pub products_discarded: u32,
    pub limits: ReportLimits,
    pub outcome: CrawlOutcome,
    pub stopped_early: bool,
    pub plan_hash: Option<String>,
    pub config_hash: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Builds the report from a finished coordinator
    pub fn from_run<R: Renderer>(
        coordinator: &Coordinator<R>,
        outcome: CrawlOutcome,
        config_hash: Option<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let config = coordinator.config();
        let visits = coordinator.visits();
        let pages_failed = visits.iter().filter(|v| !v.outcome.is_ok()).count();

        Self {
            start_urls: config.crawler.start_urls.clone(),
            pages_crawled: visits.len(),
            pages_failed,
            pages_discovered: coordinator.graph().node_count(),
            seeds_for_downstream: visits.len(),
            products_fetched: coordinator.quota().global_products(),
            products_discarded: coordinator.products_discarded(),
            limits: ReportLimits::from_config(config),
            outcome,
            stopped_early: outcome == CrawlOutcome::Stopped,
            plan_hash: coordinator.plan().map(|p| p.hash.clone()),
            config_hash,
            started_at,
            finished_at,
        }
    }

    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
