//! Renderer adapter
//!
//! The core never drives a browser or an HTTP client directly. It talks to a
//! [`Renderer`], which turns a URL into outbound links, markup, embedded
//! structured-data blocks and pagination hints:
//! - [`HttpRenderer`] fetches over HTTP(S) with reqwest and parses with scraper
//! - [`FixtureRenderer`] serves an in-memory site, for tests and offline replays
//!
//! Navigation failures come back as [`RenderError`] values; a renderer never
//! panics across this boundary.

mod extract;
mod fixture;
mod http;

pub use extract::{extract_page, ExtractedLinks};
pub use fixture::FixtureRenderer;
pub use http::{build_http_client, HttpRenderer};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors reported by a renderer for a single page
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("Navigation timeout after {timeout_ms}ms for {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    NotHtml { url: String, content_type: String },

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("No page available for {url}")]
    NotFound { url: String },

    #[error("Renderer setup failed: {0}")]
    Setup(String),
}

/// Everything a render yields for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderedPage {
    /// Raw hrefs as they appear on the page (absolute or relative)
    pub outbound_hrefs: Vec<String>,
    pub markup: String,
    /// Bodies of embedded JSON-LD blocks
    pub structured_data_blocks: Vec<String>,
    /// Links that look like "next page" navigation
    pub pagination_hints: Vec<String>,
}

impl RenderedPage {
    /// A page that only carries links
    pub fn with_links<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outbound_hrefs: links.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// The proxy identity a fetch egresses through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressIdentity {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Session number minted for this identity
    pub session: u32,
}

/// Page rendering capability
///
/// `render` is the full probe used by structure detection; `links` is the narrower
/// call used by the plain crawl path.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigates to `url` and extracts the page
    async fn render(&self, url: &Url, nav_timeout: Duration) -> Result<RenderedPage, RenderError>;

    /// Navigates to `url` and returns only its outbound hrefs
    async fn links(&self, url: &Url, nav_timeout: Duration) -> Result<Vec<String>, RenderError> {
        Ok(self.render(url, nav_timeout).await?.outbound_hrefs)
    }

    /// Switches the egress identity used for subsequent fetches
    fn use_identity(&mut self, _identity: Option<&EgressIdentity>) -> Result<(), RenderError> {
        Ok(())
    }
}
