//! In-memory renderer serving a fixed site
//!
//! Fixture files are JSON objects keyed by absolute URL:
//!
//! ```json
//! {
//!   "https://shop.test/": { "outboundHrefs": ["/catalog-shoes", "/item-1001.html"] },
//!   "https://shop.test/catalog-shoes": {
//!     "outboundHrefs": ["/item-1001.html"],
//!     "paginationHints": ["/catalog-shoes?page=2"]
//!   }
//! }
//! ```

use crate::render::{RenderError, RenderedPage, Renderer};
use crate::SweepError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// A renderer that answers from a URL → page map
#[derive(Debug, Default)]
pub struct FixtureRenderer {
    pages: HashMap<String, RenderedPage>,
    failing: HashSet<String>,
    rendered: Mutex<Vec<String>>,
}

impl FixtureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a fixture site from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, SweepError> {
        let content = std::fs::read_to_string(path)?;
        let pages: HashMap<String, RenderedPage> = serde_json::from_str(&content)?;

        let mut renderer = Self::new();
        for (url, page) in pages {
            renderer = renderer.with_render(&url, page);
        }
        Ok(renderer)
    }

    /// Adds a page that only has links
    pub fn with_page<I, S>(self, url: &str, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_render(url, RenderedPage::with_links(links))
    }

    /// Adds a fully specified page
    pub fn with_render(mut self, url: &str, page: RenderedPage) -> Self {
        self.pages.insert(fixture_key(url), page);
        self
    }

    /// Makes navigation to `url` fail
    pub fn with_failure(mut self, url: &str) -> Self {
        self.failing.insert(fixture_key(url));
        self
    }

    /// URLs rendered so far, in call order
    pub fn rendered(&self) -> Vec<String> {
        self.rendered
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    async fn render(&self, url: &Url, _nav_timeout: Duration) -> Result<RenderedPage, RenderError> {
        let key = url.as_str().to_string();

        if let Ok(mut calls) = self.rendered.lock() {
            calls.push(key.clone());
        }

        if self.failing.contains(&key) {
            return Err(RenderError::Navigation {
                url: key,
                message: "fixture failure".to_string(),
            });
        }

        self.pages
            .get(&key)
            .cloned()
            .ok_or(RenderError::NotFound { url: key })
    }
}

/// Parses the key so `https://shop.test` and `https://shop.test/` meet
fn fixture_key(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
