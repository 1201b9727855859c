//! Cached JSON fetch wrapper
//!
//! `ApiClient` fronts an HTTP JSON API with the response cache: a request
//! whose key is cached is answered without touching the network, everything
//! else is fetched, decoded and cached.
//!
//! Concurrent calls for the same uncached key are not coalesced. Each one
//! performs its own request and writes the cache, and the last write wins.

use std::future::Future;
use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::cache::{build_key, QueryParams, ResponseCache};

/// Query parameter carrying the API key
const API_KEY_PARAM: &str = "api_key";

/// Errors that can occur when fetching from the API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status
    #[error("Remote API returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// The response body was not the expected JSON
    #[error("Failed to decode JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The request URL could not be built
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Status and body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs HTTP GET requests
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<RawResponse, ApiError>> + Send;
}

/// [`Transport`] backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, ApiError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// Fetches JSON from an API, consulting the response cache first
#[derive(Debug)]
pub struct ApiClient<T = ReqwestTransport> {
    transport: T,
    base_url: Url,
    api_key: Option<String>,
    cache: Arc<ResponseCache>,
}

impl ApiClient<ReqwestTransport> {
    /// Create a client using `reqwest` for the network
    pub fn new(base_url: Url, cache: Arc<ResponseCache>) -> Self {
        Self::with_transport(ReqwestTransport::new(), base_url, cache)
    }
}

impl<T: Transport> ApiClient<T> {
    /// Create a client with a custom transport
    pub fn with_transport(transport: T, base_url: Url, cache: Arc<ResponseCache>) -> Self {
        Self {
            transport,
            base_url,
            api_key: None,
            cache,
        }
    }

    /// Sends `key` as the `api_key` query parameter on every request
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Returns the response cache shared by this client
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Builds the request URL for `path` and the non-empty `params`
    pub fn request_url(&self, path: &str, params: &QueryParams) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        ))?;

        let pairs: Vec<(&str, &str)> = self
            .api_key
            .as_deref()
            .map(|key| (API_KEY_PARAM, key))
            .into_iter()
            .chain(params.non_empty())
            .collect();

        // An empty query_pairs_mut() would still leave a trailing '?'
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }

    /// Fetches `path` with `params` as JSON
    ///
    /// # Returns
    /// * `Ok(Value)` - The cached response, or the freshly decoded body
    /// * `Err(ApiError::Remote)` - The API answered with a non-2xx status
    /// * `Err(ApiError::Decode)` - The body was not valid JSON
    ///
    /// Errors are never cached.
    pub async fn fetch_json(&self, path: &str, params: &QueryParams) -> Result<Value, ApiError> {
        let key = build_key(path, params);

        if let Some(cached) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(cached);
        }
        debug!(%key, "cache miss");

        let url = self.request_url(path, params)?;
        info!(path, "fetching from API");
        let response = self.transport.get(&url).await?;

        if !response.is_success() {
            return Err(ApiError::Remote {
                status: response.status,
                body: response.body,
            });
        }

        let value: Value = serde_json::from_str(&response.body)?;
        self.cache.set(&key, &value);
        Ok(value)
    }

    /// Fetches `path` and decodes the JSON into `D`
    pub async fn fetch<D: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<D, ApiError> {
        let value = self.fetch_json(path, params).await?;
        Ok(serde_json::from_value(value)?)
    }
}
