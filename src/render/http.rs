//! HTTP renderer implementation
//!
//! This module handles fetching pages over HTTP(S), including:
//! - Building HTTP clients with the configured user agent and egress proxy
//! - Bounding each navigation by a timeout
//! - Classifying failures into [`RenderError`] values

use crate::config::{TimingConfig, UserAgentConfig};
use crate::render::extract::extract_page;
use crate::render::{EgressIdentity, RenderError, RenderedPage, Renderer};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Proxy};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `identity` - Optional egress proxy for every request made by this client
///
/// # Example
///
/// ```no_run
/// use sumi_sweep::config::UserAgentConfig;
/// use sumi_sweep::render::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), None).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    identity: Option<&EgressIdentity>,
) -> Result<Client, RenderError> {
    let mut builder = Client::builder()
        .user_agent(user_agent.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(identity) = identity {
        let mut proxy = Proxy::all(identity.server.as_str())
            .map_err(|e| RenderError::Setup(format!("proxy {}: {}", identity.server, e)))?;
        if let Some(username) = &identity.username {
            proxy = proxy.basic_auth(username, identity.password.as_deref().unwrap_or(""));
        }
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RenderError::Setup(e.to_string()))
}

/// Renders pages by fetching them over HTTP and parsing the returned HTML
pub struct HttpRenderer {
    client: Client,
    user_agent: UserAgentConfig,
    wait_after_load: Duration,
    identity: Option<EgressIdentity>,
}

impl HttpRenderer {
    /// Creates a renderer without a proxy
    pub fn new(user_agent: UserAgentConfig, timing: &TimingConfig) -> Result<Self, RenderError> {
        let client = build_http_client(&user_agent, None)?;
        Ok(Self {
            client,
            user_agent,
            wait_after_load: Duration::from_millis(timing.wait_after_load_ms),
            identity: None,
        })
    }

    /// The identity requests currently egress through
    pub fn identity(&self) -> Option<&EgressIdentity> {
        self.identity.as_ref()
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &Url, nav_timeout: Duration) -> Result<RenderedPage, RenderError> {
        let url_str = url.as_str();

        let navigation = async {
            let response = self.client.get(url.clone()).send().await.map_err(|e| {
                RenderError::Navigation {
                    url: url_str.to_string(),
                    message: classify_reqwest_error(&e),
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(RenderError::Status {
                    url: url_str.to_string(),
                    status: status.as_u16(),
                });
            }

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            if !content_type.contains("text/html") && !content_type.contains("xhtml") {
                return Err(RenderError::NotHtml {
                    url: url_str.to_string(),
                    content_type,
                });
            }

            let final_url = response.url().clone();
            let body = response.text().await.map_err(|e| RenderError::Navigation {
                url: url_str.to_string(),
                message: e.to_string(),
            })?;

            Ok::<_, RenderError>((final_url, body))
        };

        let (final_url, body) = tokio::time::timeout(nav_timeout, navigation)
            .await
            .map_err(|_| RenderError::Timeout {
                url: url_str.to_string(),
                timeout_ms: nav_timeout.as_millis() as u64,
            })??;

        if !self.wait_after_load.is_zero() {
            tokio::time::sleep(self.wait_after_load).await;
        }

        Ok(extract_page(&body, &final_url))
    }

    fn use_identity(&mut self, identity: Option<&EgressIdentity>) -> Result<(), RenderError> {
        if self.identity.as_ref() == identity {
            return Ok(());
        }

        self.client = build_http_client(&self.user_agent, identity)?;
        self.identity = identity.cloned();
        Ok(())
    }
}

/// Turns a reqwest error into a short human-readable reason
fn classify_reqwest_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else {
        error.to_string()
    }
}
