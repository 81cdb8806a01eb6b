//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with the identification user agent and timeout
//! - Single-attempt GET requests (retries are a pipeline-level decision)
//! - Error classification into [`FetchError`]

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::record::FailureReason;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Maximum redirect hops followed before a request fails
const MAX_REDIRECTS: usize = 5;

/// Classified failure of a single fetch attempt
///
/// `Display` yields the string stored in the failure collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-2xx response
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// Connect, read or overall request timeout
    #[error("Timeout")]
    Timeout,

    /// DNS or connection-level failure
    #[error("{0}")]
    Network(String),

    /// Anything reqwest could not classify further
    #[error("{0}")]
    Unknown(String),
}

impl FetchError {
    /// Maps the error onto the failure taxonomy recorded by the pipeline
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::HttpStatus(code) => FailureReason::HttpStatus(*code),
            Self::Timeout => FailureReason::Timeout,
            Self::Network(_) => FailureReason::Network,
            Self::Unknown(_) => FailureReason::Unknown,
        }
    }

    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Network(format!("Connection failed: {}", error))
        } else if let Some(status) = error.status() {
            Self::HttpStatus(status.as_u16())
        } else {
            Self::Unknown(error.to_string())
        }
    }
}

/// The page-fetching capability consumed by the pipeline
///
/// One call is one attempt. Implementations hold no mutable state, so a single
/// instance is shared by every task in a batch.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns the raw response body
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Identification sent with every request
/// * `crawler` - Supplies the request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.request_timeout().min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration and wraps it
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, crawler)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} returned HTTP {}", url, status.as_u16());
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        tracing::trace!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }
}
