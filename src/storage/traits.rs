//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::storage::CrawlSnapshot;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Corrupt checkpoint: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backend implementations
///
/// A backend holds at most one snapshot: saving replaces whatever was there.
pub trait CheckpointStore {
    /// Replaces the stored snapshot
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The state of a stopped run
    fn save_snapshot(&mut self, snapshot: &CrawlSnapshot) -> StorageResult<()>;

    /// Loads the stored snapshot, if any
    ///
    /// # Returns
    ///
    /// * `Ok(Some(snapshot))` - A checkpoint exists
    /// * `Ok(None)` - Nothing has been saved (or it was cleared)
    fn load_snapshot(&self) -> StorageResult<Option<CrawlSnapshot>>;

    /// Discards the stored snapshot
    fn clear(&mut self) -> StorageResult<()>;
}
