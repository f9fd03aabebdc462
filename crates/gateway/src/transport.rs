//! Network transport underneath the gateway.
//!
//! The controller never talks to reqwest directly; it goes through the
//! [`Transport`] trait so tests can substitute a fake network. The real
//! implementation captures whatever the network produced (any status) and
//! only errors on network-level failure, which is what the freshness
//! strategies key their fallbacks on.

use crate::request::{AssetRequest, CapturedResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use stash_core::Error;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string (default: "stash/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: "stash/0.1".to_string(),
            timeout: Duration::from_millis(20_000),
            max_redirects: 5,
        }
    }
}

/// Asynchronous fetch seam.
///
/// Returns `Ok` for any response the network produced, including HTTP error
/// statuses; `Err(Error::Network)` is reserved for connectivity-level
/// failures (offline, DNS, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, req: &AssetRequest) -> Result<CapturedResponse, Error>;
}

/// Real transport backed by reqwest.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a client with the given configuration.
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, req: &AssetRequest) -> Result<CapturedResponse, Error> {
        let response = self
            .http
            .request(req.method.clone(), req.url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        tracing::debug!(url = %req.url, status, bytes = body.len(), "fetched");

        Ok(CapturedResponse { status, headers, body })
    }
}
