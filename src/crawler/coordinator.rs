//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl state machine
//! (`Seeding → Draining → {Done, Stopped, Exhausted}`), including:
//! - Seeding the frontier from a plan or the raw start URLs
//! - Applying the stop, budget and quota gates before each fetch
//! - Rendering pages and recording visits in fetch order
//! - Normalizing, filtering and enqueueing discovered links
//! - Snapshotting and restoring queue state for resume

use crate::config::Config;
use crate::crawler::frontier::{Frontier, FrontierItem, FrontierPolicy};
use crate::crawler::graph::DiscoveryGraph;
use crate::crawler::proxy::ProxyRotationState;
use crate::crawler::quota::{QuotaDecision, QuotaLimits, QuotaState};
use crate::crawler::stop::StopSignal;
use crate::plan::Plan;
use crate::render::Renderer;
use crate::state::{RunPhase, RunState, VisitRecord};
use crate::storage::CrawlSnapshot;
use crate::url::{
    normalize, normalize_url, ClassificationTag, Classifier, NormalizeOptions, UrlFilter,
};
use crate::{ConfigError, SweepError};
use serde::Serialize;
use std::time::{Duration, Instant};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlOutcome {
    /// At least one page was fetched successfully
    Done,
    /// The stop signal was observed
    Stopped,
    /// Nothing usable was fetched
    Exhausted,
}

impl CrawlOutcome {
    pub fn phase(&self) -> RunPhase {
        match self {
            Self::Done => RunPhase::Done,
            Self::Stopped => RunPhase::Stopped,
            Self::Exhausted => RunPhase::Exhausted,
        }
    }
}

/// Main crawler coordinator structure
///
/// Owns the renderer and all per-run state. Nothing here is global, so
/// independent coordinators can run side by side.
pub struct Coordinator<R: Renderer> {
    config: Config,
    renderer: R,
    plan: Option<Plan>,
    stop: StopSignal,
    options: NormalizeOptions,
    classifier: Classifier,
    filter: UrlFilter,
    frontier: Frontier,
    quota: QuotaState,
    limits: QuotaLimits,
    graph: DiscoveryGraph,
    visits: Vec<VisitRecord>,
    run: RunState,
    proxy: ProxyRotationState,
    ok_fetches: u32,
    products_discarded: u32,
    seeded: bool,
}

impl<R: Renderer> Coordinator<R> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `renderer` - The renderer pages are fetched with
    /// * `plan` - Structure-detection output; `None` for plain BFS
    /// * `stop` - The cooperative stop signal
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to seed and drain
    /// * `Err(SweepError)` - No usable start URL or a pattern failed to compile
    pub fn new(
        config: Config,
        renderer: R,
        plan: Option<Plan>,
        stop: StopSignal,
    ) -> Result<Self, SweepError> {
        let root_raw = match &plan {
            Some(plan) => plan.root.clone(),
            None => config.crawler.start_urls.first().cloned().ok_or_else(|| {
                ConfigError::Validation("at least one start URL is required".to_string())
            })?,
        };
        let root = normalize_url(&root_raw, None, &NormalizeOptions::default())
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", root_raw, e)))?;
        let options = NormalizeOptions::from_config(&config.scope, &root);

        let configured = Classifier::new(
            &config.classify.category_pattern,
            &config.classify.product_pattern,
        )?;
        // Plan groups only name the probed pages; the configured patterns keep
        // every other product-shaped link under quota
        let classifier = match &plan {
            Some(plan) => match Classifier::new(&plan.category_regex, &plan.product_regex) {
                Ok(planned) => planned.union(&configured)?,
                Err(e) => {
                    tracing::warn!("Plan patterns unusable, using configured ones: {}", e);
                    configured
                }
            },
            None => configured,
        };

        let policy = if config.crawler.deterministic {
            FrontierPolicy::Sorted
        } else {
            FrontierPolicy::Tiered
        };

        Ok(Self {
            filter: UrlFilter::from_config(&config.scope)?,
            limits: QuotaLimits::from_config(&config.structure),
            frontier: Frontier::new(policy),
            quota: QuotaState::new(),
            graph: DiscoveryGraph::new(),
            visits: Vec::new(),
            run: RunState::new(),
            proxy: ProxyRotationState::new(),
            ok_fetches: 0,
            products_discarded: 0,
            seeded: false,
            options,
            classifier,
            config,
            renderer,
            plan,
            stop,
        })
    }

    /// Populates the frontier
    ///
    /// With a plan: the root and every category at depth 0 as categories, then
    /// every product at depth 1 under its plan category. Without one: the start
    /// URLs at depth 0, classified by URL shape. Seeds that fail normalization
    /// or were already seen are skipped.
    ///
    /// # Returns
    ///
    /// The number of seeds added
    pub fn seed(&mut self) -> usize {
        let seeds: Vec<(String, u32, ClassificationTag, Option<String>)> = match &self.plan {
            Some(plan) => std::iter::once(&plan.root)
                .chain(plan.categories.iter())
                .map(|url| (url.clone(), 0, ClassificationTag::Category, None))
                .chain(plan.product_list.iter().map(|url| {
                    (
                        url.clone(),
                        1,
                        ClassificationTag::Product,
                        plan.origin_category(url).map(String::from),
                    )
                }))
                .collect(),
            None => self
                .config
                .crawler
                .start_urls
                .iter()
                .filter_map(|raw| normalize(raw, None, &self.options))
                .map(|url| {
                    let tag = self.classifier.classify(&url);
                    (url.to_string(), 0, tag, None)
                })
                .collect(),
        };

        let mut added = 0;
        for (raw, depth, tag, origin) in seeds {
            let Some(url) = normalize(&raw, None, &self.options) else {
                continue;
            };
            if !self.graph.add_node(url.as_str(), depth) {
                continue;
            }
            self.frontier
                .push(FrontierItem::new(url, depth, tag).with_origin(origin));
            added += 1;
        }

        self.seeded = true;
        tracing::info!("Seeded frontier with {} URLs", added);
        added
    }

    /// Continues from a checkpoint instead of seeding
    pub fn restore(&mut self, snapshot: CrawlSnapshot) {
        let current_hash = self.plan.as_ref().map(|p| p.hash.clone());
        if snapshot.plan_hash != current_hash {
            tracing::warn!(
                "Checkpoint was taken under plan {:?}, resuming under {:?}",
                snapshot.plan_hash,
                current_hash
            );
        }

        self.frontier = Frontier::from_ordered(self.frontier.policy(), snapshot.frontier);
        self.graph = DiscoveryGraph::from_parts(snapshot.nodes, snapshot.edges);
        self.ok_fetches = snapshot
            .visits
            .iter()
            .filter(|v| v.outcome.is_ok())
            .count() as u32;
        self.visits = snapshot.visits;
        self.quota = snapshot.quota;
        self.products_discarded = snapshot.products_discarded;
        self.seeded = true;

        tracing::info!(
            "Restored checkpoint: {} visits, {} in frontier, {} discovered",
            self.visits.len(),
            self.frontier.len(),
            self.graph.node_count()
        );
    }

    /// Runs the crawl to a terminal phase
    ///
    /// Seeds first unless [`seed`](Self::seed) or [`restore`](Self::restore)
    /// already ran. Render failures are recorded as failed visits and never
    /// end the run.
    pub async fn run(&mut self) -> Result<CrawlOutcome, SweepError> {
        if !self.seeded {
            self.seed();
        }
        self.run.transition(RunPhase::Draining)?;

        let max_pages = self.config.crawler.max_pages as usize;
        let nav_timeout = Duration::from_millis(self.config.timing.navigation_timeout_ms);
        let start_time = Instant::now();
        let visits_at_start = self.visits.len();
        let mut stopped = false;

        loop {
            if self.stop.is_raised() {
                tracing::info!("Stop signal observed, ending run");
                stopped = true;
                break;
            }

            if self.visits.len() >= max_pages {
                tracing::info!("Page budget of {} reached", max_pages);
                break;
            }

            let item = match self.frontier.pop() {
                Some(item) => item,
                None => {
                    tracing::info!("Frontier is empty, crawl complete");
                    break;
                }
            };

            if let QuotaDecision::Discard(reason) = self.quota.try_admit(&item, &self.limits) {
                tracing::debug!("Quota discard of {}: {:?}", item.url, reason);
                self.products_discarded += 1;
                continue;
            }

            self.process_item(item, nav_timeout).await;

            let crawled = self.visits.len() - visits_at_start;
            if crawled > 0 && crawled % 10 == 0 {
                let rate = crawled as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                    self.visits.len(),
                    self.frontier.len(),
                    rate
                );
            }
        }

        let outcome = if stopped {
            CrawlOutcome::Stopped
        } else if self.ok_fetches > 0 {
            CrawlOutcome::Done
        } else {
            CrawlOutcome::Exhausted
        };
        self.run.transition(outcome.phase())?;

        tracing::info!(
            "Crawl {}: {} pages crawled ({} ok), {} discovered, {} products fetched, {} discarded in {:?}",
            outcome.phase(),
            self.visits.len(),
            self.ok_fetches,
            self.graph.node_count(),
            self.quota.global_products(),
            self.products_discarded,
            start_time.elapsed()
        );

        Ok(outcome)
    }

    /// Fetches one admitted item and records the visit
    async fn process_item(&mut self, item: FrontierItem, nav_timeout: Duration) {
        if let Some(identity) = self.proxy.advance(&self.config.proxy, self.ok_fetches) {
            tracing::info!(
                "Switching egress to {} (session {})",
                identity.server,
                identity.session
            );
            if let Err(e) = self.renderer.use_identity(Some(&identity)) {
                tracing::warn!("Failed to switch egress identity: {}", e);
            }
        }

        let url_str = item.url.to_string();
        tracing::debug!("Processing URL: {} ({}, depth {})", url_str, item.tag, item.depth);
        self.graph.mark_crawled(&url_str);

        match self.renderer.links(&item.url, nav_timeout).await {
            Ok(links) => {
                self.ok_fetches += 1;
                self.visits
                    .push(VisitRecord::ok(&url_str, item.depth, item.tag, links.len()));
                self.handle_discovered_links(&item, &links);
            }
            Err(e) => {
                tracing::warn!("Failed to render {}: {}", url_str, e);
                self.visits.push(VisitRecord::failed(
                    &url_str,
                    item.depth,
                    item.tag,
                    e.to_string(),
                ));
            }
        }
    }

    /// Records and enqueues the links found on a page
    ///
    /// Every in-scope, allowed link becomes a graph edge and (if new) a node.
    /// Only links within the depth limit enter the frontier, and pages already
    /// deeper than the limit are not expanded at all.
    fn handle_discovered_links(&mut self, page: &FrontierItem, links: &[String]) {
        let max_depth = self.config.crawler.max_depth;
        if page.depth > max_depth {
            tracing::debug!("Not expanding {} beyond max depth", page.url);
            return;
        }

        let from = page.url.to_string();
        let child_depth = page.depth + 1;
        let origin = match page.tag {
            ClassificationTag::Category => Some(from.clone()),
            _ => page.origin_category.clone(),
        };

        for link in links {
            let Some(normalized) = normalize(link, Some(&page.url), &self.options) else {
                continue;
            };
            let normalized_str = normalized.to_string();

            if !self.filter.is_allowed(&normalized_str) {
                tracing::debug!("Filtered out {}", normalized_str);
                continue;
            }

            self.graph.add_edge(&from, &normalized_str);
            if !self.graph.add_node(&normalized_str, child_depth) || child_depth > max_depth {
                continue;
            }

            let tag = self.classifier.classify(&normalized);
            let origin = match tag {
                ClassificationTag::Product => origin.clone(),
                _ => None,
            };
            self.frontier
                .push(FrontierItem::new(normalized, child_depth, tag).with_origin(origin));
        }
    }

    /// Captures the queue state for a checkpoint
    pub fn snapshot(&self) -> CrawlSnapshot {
        CrawlSnapshot {
            policy: self.frontier.policy(),
            frontier: self.frontier.snapshot(),
            nodes: self.graph.nodes().to_vec(),
            edges: self.graph.edges().to_vec(),
            visits: self.visits.clone(),
            quota: self.quota.clone(),
            products_discarded: self.products_discarded,
            plan_hash: self.plan.as_ref().map(|p| p.hash.clone()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn phase(&self) -> RunPhase {
        self.run.phase()
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn graph(&self) -> &DiscoveryGraph {
        &self.graph
    }

    pub fn quota(&self) -> &QuotaState {
        &self.quota
    }

    /// Visit records in fetch order
    pub fn visits(&self) -> &[VisitRecord] {
        &self.visits
    }

    pub fn ok_fetches(&self) -> u32 {
        self.ok_fetches
    }

    pub fn products_discarded(&self) -> u32 {
        self.products_discarded
    }
}
