//! Visit records

use crate::url::ClassificationTag;
use std::fmt;

/// Result of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    Ok,
    /// The render failed; the message is the renderer's reason
    Error(String),
}

impl VisitOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// One fetched (or attempted) page, kept in fetch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub url: String,
    pub depth: u32,
    pub tag: ClassificationTag,
    /// Outbound links reported by the renderer
    pub link_count: usize,
    pub outcome: VisitOutcome,
}

impl VisitRecord {
    pub fn ok(url: &str, depth: u32, tag: ClassificationTag, link_count: usize) -> Self {
        Self {
            url: url.to_string(),
            depth,
            tag,
            link_count,
            outcome: VisitOutcome::Ok,
        }
    }

    pub fn failed(url: &str, depth: u32, tag: ClassificationTag, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            depth,
            tag,
            link_count: 0,
            outcome: VisitOutcome::Error(reason.into()),
        }
    }
}
