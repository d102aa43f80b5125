//! Storage module for resumable runs
//!
//! When a run ends because the stop signal was observed, its queue state is
//! written to a SQLite checkpoint so a later run can pick up where it left off:
//! - The frontier, in pop order
//! - The discovery graph
//! - The visit records, in fetch order
//! - The quota counters

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCheckpoint;
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::crawler::{FrontierItem, FrontierPolicy, GraphEdge, GraphNode, QuotaState};
use crate::state::VisitRecord;
use std::path::Path;

/// File name of the checkpoint inside the crawl directory
pub const CHECKPOINT_FILE_NAME: &str = "checkpoint.db";

/// Opens (or creates) the checkpoint database at `path`
pub fn open_checkpoint(path: &Path) -> StorageResult<SqliteCheckpoint> {
    SqliteCheckpoint::new(path)
}

/// Everything needed to continue a stopped run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSnapshot {
    pub policy: FrontierPolicy,
    pub frontier: Vec<FrontierItem>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub visits: Vec<VisitRecord>,
    pub quota: QuotaState,
    pub products_discarded: u32,
    /// Hash of the plan the run was seeded from
    pub plan_hash: Option<String>,
}
