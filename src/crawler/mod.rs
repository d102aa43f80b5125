//! Crawler module for plan-driven breadth-first sweeps
//!
//! This module contains the core crawling logic, including:
//! - The frontier and its tiered or sorted ordering
//! - Per-category and global product quotas
//! - The discovery graph
//! - Egress proxy rotation
//! - The cooperative stop signal
//! - Overall crawl coordination

mod coordinator;
mod frontier;
mod graph;
mod proxy;
mod quota;
mod stop;

pub use coordinator::{Coordinator, CrawlOutcome};
pub use frontier::{Frontier, FrontierItem, FrontierPolicy};
pub use graph::{DiscoveryGraph, GraphEdge, GraphNode};
pub use proxy::{select_identity, ProxyRotationState};
pub use quota::{DiscardReason, QuotaDecision, QuotaLimits, QuotaState};
pub use stop::StopSignal;

use crate::config::Config;
use crate::output::{ArtifactWriter, RunReport};
use crate::plan::prepare_plan;
use crate::render::Renderer;
use crate::storage::{
    open_checkpoint, CheckpointStore, CrawlSnapshot, StorageResult, CHECKPOINT_FILE_NAME,
};
use crate::SweepError;
use chrono::Utc;
use std::path::Path;

/// Per-invocation switches that are not part of the config file
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Ignore any checkpoint and rebuild the plan
    pub fresh: bool,
    /// Continue from the checkpoint of a stopped run
    pub resume: bool,
    /// Hash of the config file, recorded in the report
    pub config_hash: Option<String>,
}

/// Runs a complete sweep
///
/// This is the main entry point for a run. It will:
/// 1. Prepare the plan when structure detection is enabled
/// 2. Seed the frontier, or restore it from a checkpoint
/// 3. Drain the frontier until done, stopped or out of budget
/// 4. Save or clear the checkpoint
/// 5. Write the run artifacts
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `renderer` - The renderer pages are fetched with
/// * `options` - Invocation switches
/// * `stop` - The cooperative stop signal
///
/// # Returns
///
/// * `Ok(RunReport)` - The run finished in a terminal phase
/// * `Err(SweepError)` - The run could not be set up
pub async fn run_sweep<R: Renderer>(
    config: Config,
    renderer: R,
    options: &SweepOptions,
    stop: StopSignal,
) -> Result<RunReport, SweepError> {
    let started_at = Utc::now();
    let crawl_dir = config.crawl_dir();
    clear_stale_sentinel(&stop);

    let plan = if config.structure.enabled {
        Some(prepare_plan(&config, &renderer, options.fresh).await?)
    } else {
        None
    };

    let mut coordinator = Coordinator::new(config, renderer, plan, stop)?;

    let checkpoint_path = crawl_dir.join(CHECKPOINT_FILE_NAME);
    let resume = (options.resume || coordinator.config().crawler.resume) && !options.fresh;
    if resume {
        match load_checkpoint(&checkpoint_path) {
            Ok(Some(snapshot)) => coordinator.restore(snapshot),
            Ok(None) => tracing::info!("No checkpoint to resume from, seeding"),
            Err(e) => tracing::warn!("Failed to load checkpoint, seeding: {}", e),
        }
    }

    let outcome = coordinator.run().await?;

    let checkpoint = if outcome == CrawlOutcome::Stopped {
        open_checkpoint(&checkpoint_path)
            .and_then(|mut store| store.save_snapshot(&coordinator.snapshot()))
            .map(|_| tracing::info!("Saved checkpoint to {}", checkpoint_path.display()))
    } else if checkpoint_path.exists() {
        open_checkpoint(&checkpoint_path).and_then(|mut store| store.clear())
    } else {
        Ok(())
    };
    if let Err(e) = checkpoint {
        tracing::warn!("Failed to update checkpoint: {}", e);
    }

    let report = RunReport::from_run(
        &coordinator,
        outcome,
        options.config_hash.clone(),
        started_at,
        Utc::now(),
    );

    let writer = ArtifactWriter::new(crawl_dir);
    if let Err(e) = writer.write_all(coordinator.visits(), coordinator.graph(), &report) {
        tracing::warn!("Failed to write run artifacts: {}", e);
    }

    Ok(report)
}

fn load_checkpoint(path: &Path) -> StorageResult<Option<CrawlSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    open_checkpoint(path)?.load_snapshot()
}

/// A sentinel left behind by an earlier run would stop this one before it starts
fn clear_stale_sentinel(stop: &StopSignal) {
    let Some(path) = stop.sentinel() else {
        return;
    };
    if path.exists() {
        tracing::warn!("Removing stale stop file {}", path.display());
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("Failed to remove stop file {}: {}", path.display(), e);
        }
    }
}
