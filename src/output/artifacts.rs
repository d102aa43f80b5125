//! Artifact files of a run
//!
//! Everything lands in the `_crawl` directory:
//! - `urls.txt`: visited URLs in fetch order, one per line
//! - `discovered-debug.txt`: every URL ever seen, in discovery order
//! - `graph.json`: `{nodes: [{url, depth, crawled}], edges: [{from, to}]}`
//! - `report.json`: the [`RunReport`]
//!
//! `plan.json` is written alongside by [`crate::plan::prepare_plan`].

use crate::crawler::DiscoveryGraph;
use crate::output::report::RunReport;
use crate::state::VisitRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const URLS_FILE: &str = "urls.txt";
pub const DISCOVERED_FILE: &str = "discovered-debug.txt";
pub const GRAPH_FILE: &str = "graph.json";
pub const REPORT_FILE: &str = "report.json";

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes run artifacts into one directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes every artifact of a finished run
    pub fn write_all(
        &self,
        visits: &[VisitRecord],
        graph: &DiscoveryGraph,
        report: &RunReport,
    ) -> OutputResult<()> {
        self.write_urls(visits)?;
        self.write_discovered(graph)?;
        self.write_graph(graph)?;
        self.write_report(report)?;
        tracing::info!("Wrote run artifacts to {}", self.dir.display());
        Ok(())
    }

    /// `urls.txt`: exactly the visit records, in fetch order
    pub fn write_urls(&self, visits: &[VisitRecord]) -> OutputResult<()> {
        self.write_lines(URLS_FILE, visits.iter().map(|v| v.url.as_str()))
    }

    pub fn write_discovered(&self, graph: &DiscoveryGraph) -> OutputResult<()> {
        self.write_lines(DISCOVERED_FILE, graph.nodes().iter().map(|n| n.url.as_str()))
    }

    pub fn write_graph(&self, graph: &DiscoveryGraph) -> OutputResult<()> {
        self.write_json(GRAPH_FILE, graph)
    }

    pub fn write_report(&self, report: &RunReport) -> OutputResult<()> {
        self.write_json(REPORT_FILE, report)
    }

    fn write_lines<'a>(
        &self,
        name: &str,
        lines: impl Iterator<Item = &'a str>,
    ) -> OutputResult<()> {
        let mut content = String::new();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        self.write_file(name, content.as_bytes())
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> OutputResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_file(name, json.as_bytes())
    }

    fn write_file(&self, name: &str, content: &[u8]) -> OutputResult<()> {
        let path = self.dir.join(name);
        let write_error = |source| OutputError::Write {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_error)?;
        fs::write(&path, content).map_err(write_error)
    }
}
