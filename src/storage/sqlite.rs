//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CheckpointStore trait.

use crate::crawler::{FrontierItem, FrontierPolicy, GraphEdge, GraphNode, QuotaState};
use crate::state::{VisitOutcome, VisitRecord};
use crate::storage::schema::{initialize_schema, TABLES};
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::CrawlSnapshot;
use crate::url::ClassificationTag;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

/// SQLite checkpoint backend
pub struct SqliteCheckpoint {
    conn: Connection,
}

impl SqliteCheckpoint {
    /// Opens or creates a checkpoint database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn meta(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn load_frontier(&self) -> StorageResult<Vec<FrontierItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, depth, tag, origin_category FROM frontier ORDER BY position ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, depth, tag, origin)| {
                let url = Url::parse(&url)
                    .map_err(|e| StorageError::Corrupt(format!("frontier url {}: {}", url, e)))?;
                Ok(FrontierItem::new(url, depth, parse_tag(&tag)?).with_origin(origin))
            })
            .collect()
    }

    fn load_nodes(&self) -> StorageResult<Vec<GraphNode>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, depth, crawled FROM nodes ORDER BY position ASC")?;
        let nodes = stmt
            .query_map([], |row| {
                Ok(GraphNode {
                    url: row.get(0)?,
                    depth: row.get(1)?,
                    crawled: row.get::<_, i32>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    fn load_edges(&self) -> StorageResult<Vec<GraphEdge>> {
        let mut stmt = self
            .conn
            .prepare("SELECT from_url, to_url FROM edges ORDER BY position ASC")?;
        let edges = stmt
            .query_map([], |row| {
                Ok(GraphEdge {
                    from: row.get(0)?,
                    to: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    fn load_visits(&self) -> StorageResult<Vec<VisitRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, depth, tag, link_count, error FROM visits ORDER BY position ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, depth, tag, link_count, error)| {
                Ok(VisitRecord {
                    url,
                    depth,
                    tag: parse_tag(&tag)?,
                    link_count: link_count as usize,
                    outcome: error.map(VisitOutcome::Error).unwrap_or(VisitOutcome::Ok),
                })
            })
            .collect()
    }

    fn load_quota(&self) -> StorageResult<BTreeMap<String, u32>> {
        let mut stmt = self.conn.prepare("SELECT category, fetched FROM quota")?;
        let quota = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(quota)
    }
}

impl CheckpointStore for SqliteCheckpoint {
    fn save_snapshot(&mut self, snapshot: &CrawlSnapshot) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        clear_tables(&tx)?;

        {
            let mut meta = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
            meta.execute(params!["saved_at", Utc::now().to_rfc3339()])?;
            meta.execute(params!["policy", policy_to_db_string(snapshot.policy)])?;
            meta.execute(params![
                "global_products",
                snapshot.quota.global_products().to_string()
            ])?;
            meta.execute(params![
                "products_discarded",
                snapshot.products_discarded.to_string()
            ])?;
            if let Some(hash) = &snapshot.plan_hash {
                meta.execute(params!["plan_hash", hash])?;
            }

            let mut frontier = tx.prepare(
                "INSERT INTO frontier (position, url, depth, tag, origin_category)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (i, item) in snapshot.frontier.iter().enumerate() {
                frontier.execute(params![
                    i as i64,
                    item.url.as_str(),
                    item.depth,
                    item.tag.as_str(),
                    item.origin_category
                ])?;
            }

            let mut nodes =
                tx.prepare("INSERT INTO nodes (position, url, depth, crawled) VALUES (?1, ?2, ?3, ?4)")?;
            for (i, node) in snapshot.nodes.iter().enumerate() {
                nodes.execute(params![i as i64, node.url, node.depth, node.crawled as i32])?;
            }

            let mut edges =
                tx.prepare("INSERT INTO edges (position, from_url, to_url) VALUES (?1, ?2, ?3)")?;
            for (i, edge) in snapshot.edges.iter().enumerate() {
                edges.execute(params![i as i64, edge.from, edge.to])?;
            }

            let mut visits = tx.prepare(
                "INSERT INTO visits (position, url, depth, tag, link_count, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (i, visit) in snapshot.visits.iter().enumerate() {
                let error = match &visit.outcome {
                    VisitOutcome::Ok => None,
                    VisitOutcome::Error(reason) => Some(reason.as_str()),
                };
                visits.execute(params![
                    i as i64,
                    visit.url,
                    visit.depth,
                    visit.tag.as_str(),
                    visit.link_count as i64,
                    error
                ])?;
            }

            let mut quota = tx.prepare("INSERT INTO quota (category, fetched) VALUES (?1, ?2)")?;
            for (category, fetched) in snapshot.quota.per_category() {
                quota.execute(params![category, fetched])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load_snapshot(&self) -> StorageResult<Option<CrawlSnapshot>> {
        if self.meta("saved_at")?.is_none() {
            return Ok(None);
        }

        let policy = match self.meta("policy")?.as_deref() {
            Some("sorted") => FrontierPolicy::Sorted,
            Some("tiered") => FrontierPolicy::Tiered,
            other => {
                return Err(StorageError::Corrupt(format!(
                    "unknown frontier policy {:?}",
                    other
                )))
            }
        };
        let global_products = parse_counter(self.meta("global_products")?, "global_products")?;
        let products_discarded =
            parse_counter(self.meta("products_discarded")?, "products_discarded")?;

        Ok(Some(CrawlSnapshot {
            policy,
            frontier: self.load_frontier()?,
            nodes: self.load_nodes()?,
            edges: self.load_edges()?,
            visits: self.load_visits()?,
            quota: QuotaState::from_parts(self.load_quota()?, global_products),
            products_discarded,
            plan_hash: self.meta("plan_hash")?,
        }))
    }

    fn clear(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        clear_tables(&tx)?;
        tx.commit()?;
        Ok(())
    }
}

fn clear_tables(tx: &Transaction<'_>) -> StorageResult<()> {
    for table in TABLES {
        tx.execute(&format!("DELETE FROM {}", table), [])?;
    }
    Ok(())
}

fn policy_to_db_string(policy: FrontierPolicy) -> &'static str {
    match policy {
        FrontierPolicy::Tiered => "tiered",
        FrontierPolicy::Sorted => "sorted",
    }
}

fn parse_tag(tag: &str) -> StorageResult<ClassificationTag> {
    ClassificationTag::parse(tag)
        .ok_or_else(|| StorageError::Corrupt(format!("unknown classification tag '{}'", tag)))
}

fn parse_counter(value: Option<String>, key: &str) -> StorageResult<u32> {
    match value {
        None => Ok(0),
        Some(v) => v
            .parse()
            .map_err(|_| StorageError::Corrupt(format!("{} is not a number: '{}'", key, v))),
    }
}
