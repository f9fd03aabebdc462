//! Request classification.
//!
//! Every intercepted request lands in exactly one routing class, checked in
//! priority order. Anything that matches no caching class defaults to
//! network pass-through, never to an undefined cache operation.

use crate::request::{AssetRequest, RequestMode};
use reqwest::Method;

/// Routing class for one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Remote data service traffic. Never intercepted, never cached.
    RemoteApi,
    /// Top-level page load. Network-First with cached-shell fallback.
    Navigation,
    /// Static subresource GET. Stale-While-Revalidate.
    Asset,
    /// Matched no caching class (e.g. a non-GET to an arbitrary host);
    /// passes straight to the network.
    Passthrough,
}

/// Classify a request against the remote data service host.
///
/// `api_host` matches the host itself or any of its subdomains.
pub fn classify(req: &AssetRequest, api_host: &str) -> RouteClass {
    if let Some(host) = req.url.host_str()
        && host_matches(host, api_host)
    {
        return RouteClass::RemoteApi;
    }

    if req.mode == RequestMode::Navigate {
        return RouteClass::Navigation;
    }

    if req.method != Method::GET {
        return RouteClass::Passthrough;
    }

    RouteClass::Asset
}

fn host_matches(host: &str, api_host: &str) -> bool {
    host == api_host || host.ends_with(&format!(".{api_host}"))
}
