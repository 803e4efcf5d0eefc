//! Fetching subscription documents from their remote source.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use subs_model::{RawSubscription, VersionDescriptor};

use crate::error::{Result, UpdateError};

/// User agent string for requests when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("subs-engine/", env!("CARGO_PKG_VERSION"));

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of remote subscription documents.
pub trait SubscriptionFetcher: Send + Sync {
    /// Fetch the lightweight `{id, version}` descriptor from a check URL.
    fn fetch_version(&self, url: &str) -> impl Future<Output = Result<VersionDescriptor>> + Send;

    /// Fetch and parse a full document.
    fn fetch_subscription(&self, url: &str) -> impl Future<Output = Result<RawSubscription>> + Send;
}

/// HTTP client for subscription sources.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a client with the default user agent and timeout.
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    pub fn with_options(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| UpdateError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        tracing::debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

impl SubscriptionFetcher for HttpFetcher {
    async fn fetch_version(&self, url: &str) -> Result<VersionDescriptor> {
        let descriptor: VersionDescriptor = self.get(url).await?.json().await?;
        Ok(descriptor)
    }

    async fn fetch_subscription(&self, url: &str) -> Result<RawSubscription> {
        let text = self.get(url).await?.text().await?;
        Ok(RawSubscription::from_json(&text)?)
    }
}
