//! Output module for run artifacts and summaries
//!
//! This module handles:
//! - Writing the `_crawl` artifact files
//! - Building the run report
//! - Printing a console summary

mod artifacts;
mod report;
pub mod stats;

pub use artifacts::{
    ArtifactWriter, OutputError, OutputResult, DISCOVERED_FILE, GRAPH_FILE, REPORT_FILE,
    URLS_FILE,
};
pub use report::{ReportLimits, RunReport};
pub use stats::print_summary;
