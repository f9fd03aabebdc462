//! Request and captured-response types the gateway routes on.

use bytes::Bytes;
use reqwest::Method;
use url::Url;

/// How the request was issued by the application shell.
///
/// Navigations are top-level page loads and get Network-First treatment;
/// everything else is a subresource (script, stylesheet, image).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    Subresource,
}

/// One intercepted outbound request.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
}

impl AssetRequest {
    /// A subresource GET.
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::Subresource }
    }

    /// A top-level navigation.
    pub fn navigate(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::Navigate }
    }

    /// Cache identity of this request: method plus full URL.
    ///
    /// Two requests with the same identity share one cache entry.
    pub fn identity(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A captured response: status, headers, and body, exactly as the network
/// produced them. This is what the cache stores and replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl CapturedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
