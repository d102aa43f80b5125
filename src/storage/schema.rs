//! Database schema definitions
//!
//! This module contains the SQL schema of the resume checkpoint. Every table
//! that holds an ordered sequence keys it by `position`.

/// SQL schema for the checkpoint database
pub const SCHEMA_SQL: &str = r#"
-- Scalar run state (saved_at, plan hash, counters, frontier policy)
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Frontier items in pop order
CREATE TABLE IF NOT EXISTS frontier (
    position INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    depth INTEGER NOT NULL,
    tag TEXT NOT NULL,
    origin_category TEXT
);

-- Discovery graph nodes in first-seen order
CREATE TABLE IF NOT EXISTS nodes (
    position INTEGER PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    depth INTEGER NOT NULL,
    crawled INTEGER NOT NULL DEFAULT 0
);

-- Discovery graph edges in extraction order
CREATE TABLE IF NOT EXISTS edges (
    position INTEGER PRIMARY KEY,
    from_url TEXT NOT NULL,
    to_url TEXT NOT NULL
);

-- Visit records in fetch order; error is NULL for successful fetches
CREATE TABLE IF NOT EXISTS visits (
    position INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    depth INTEGER NOT NULL,
    tag TEXT NOT NULL,
    link_count INTEGER NOT NULL,
    error TEXT
);

-- Fetched products per owning category
CREATE TABLE IF NOT EXISTS quota (
    category TEXT PRIMARY KEY,
    fetched INTEGER NOT NULL
);
"#;

/// Tables cleared when a checkpoint is replaced or discarded
pub const TABLES: [&str; 6] = ["meta", "frontier", "nodes", "edges", "visits", "quota"];

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
