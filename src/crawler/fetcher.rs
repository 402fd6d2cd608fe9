//! Content retrieval and the retrying fetcher
//!
//! This module handles how raw page content is obtained:
//! - Building HTTP clients with a proper user agent string
//! - Retrieving content directly, through a local proxy, or through a
//!   fetch-and-render service
//! - Retrying failed retrievals according to a [`RetryPolicy`]

use crate::config::{RetrievalConfig, RetrievalModeKind, UserAgentConfig};
use crate::crawler::RetryPolicy;
use crate::url::Address;
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Accept header sent to the local proxy
const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Errors raised while retrieving page content
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} for {address}")]
    Status { status: u16, address: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Something that can hand back the raw content of an address
///
/// Implementations perform a single attempt; retrying is layered on top by
/// [`RetryingFetcher`].
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Retrieves the raw content of `address`
    async fn retrieve(&self, address: &Address) -> Result<String, FetchError>;

    /// Short name used in log messages
    fn name(&self) -> &'static str;
}

/// Where an [`HttpSource`] sends its requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalMode {
    /// `GET` the address itself
    Direct,

    /// `GET {base}/proxy?url=<address>` on a local development proxy
    LocalProxy { base: Url },

    /// `POST {"url": <address>}` to a service that renders the page and
    /// replies with `{"html": "..."}`
    RenderProxy { endpoint: Url },
}

impl RetrievalMode {
    /// Builds a retrieval mode from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(RetrievalMode)` - The configured mode
    /// * `Err(ConfigError)` - A proxy mode without a usable proxy URL
    pub fn from_config(config: &RetrievalConfig) -> Result<Self, ConfigError> {
        let proxy_url = || -> Result<Url, ConfigError> {
            let raw = config.proxy_url.as_deref().ok_or_else(|| {
                ConfigError::Validation("retrieval.proxy-url is required for proxy modes".to_string())
            })?;
            Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw, e)))
        };

        Ok(match config.mode {
            RetrievalModeKind::Direct => RetrievalMode::Direct,
            RetrievalModeKind::LocalProxy => RetrievalMode::LocalProxy { base: proxy_url()? },
            RetrievalModeKind::RenderProxy => RetrievalMode::RenderProxy {
                endpoint: proxy_url()?,
            },
        })
    }
}

/// Reply body of a fetch-and-render service
#[derive(Debug, Deserialize)]
struct RenderReply {
    html: Option<String>,
}

/// Retrieves content over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    mode: RetrievalMode,
}

impl HttpSource {
    /// Creates a source using `client` for every request
    pub fn new(client: Client, mode: RetrievalMode) -> Self {
        Self { client, mode }
    }

    /// The retrieval mode of this source
    pub fn mode(&self) -> &RetrievalMode {
        &self.mode
    }

    async fn get_direct(&self, address: &Address) -> Result<String, FetchError> {
        let response = self.client.get(address.as_str()).send().await?;
        Self::success_body(response, address).await
    }

    async fn get_via_proxy(&self, base: &Url, address: &Address) -> Result<String, FetchError> {
        let proxy = proxy_endpoint(base)?;

        let response = self
            .client
            .get(proxy)
            .query(&[("url", address.as_str())])
            .header(ACCEPT, HTML_ACCEPT)
            .send()
            .await?;
        Self::success_body(response, address).await
    }

    async fn post_to_renderer(&self, endpoint: &Url, address: &Address) -> Result<String, FetchError> {
        let response = self
            .client
            .post(endpoint.clone())
            .json(&serde_json::json!({ "url": address.as_str() }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                address: address.to_string(),
            });
        }

        let reply: RenderReply = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        reply
            .html
            .ok_or_else(|| FetchError::InvalidResponse("render reply has no html field".to_string()))
    }

    async fn success_body(response: reqwest::Response, address: &Address) -> Result<String, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                address: address.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// `{base}/proxy`, keeping every path segment of `base`
fn proxy_endpoint(base: &Url) -> Result<Url, FetchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidResponse(format!("proxy base {} cannot take a path", base)))?
        .pop_if_empty()
        .push("proxy");
    Ok(url)
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn retrieve(&self, address: &Address) -> Result<String, FetchError> {
        match &self.mode {
            RetrievalMode::Direct => self.get_direct(address).await,
            RetrievalMode::LocalProxy { base } => self.get_via_proxy(base, address).await,
            RetrievalMode::RenderProxy { endpoint } => self.post_to_renderer(endpoint, address).await,
        }
    }

    fn name(&self) -> &'static str {
        match self.mode {
            RetrievalMode::Direct => "direct",
            RetrievalMode::LocalProxy { .. } => "local-proxy",
            RetrievalMode::RenderProxy { .. } => "render-proxy",
        }
    }
}

/// Fetches raw content through a [`ContentSource`], retrying failures
#[derive(Clone)]
pub struct RetryingFetcher {
    source: Arc<dyn ContentSource>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    /// Creates a fetcher over `source` with the given retry policy
    pub fn new(source: Arc<dyn ContentSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// The retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches the raw content of `address`
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Raw content from the first successful attempt
    /// * `Err(FetchError)` - The final attempt's error once retries are exhausted
    pub async fn fetch(&self, address: &Address) -> Result<String, FetchError> {
        let label = format!("Fetch of {} via {}", address, self.source.name());
        let source = &self.source;
        self.policy
            .run(&label, move || source.retrieve(address))
            .await
    }
}

impl std::fmt::Debug for RetryingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingFetcher")
            .field("source", &self.source.name())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_harvest::config::UserAgentConfig;
/// use sumi_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format_user_agent(config))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Formats the user agent as `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn format_user_agent(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}
