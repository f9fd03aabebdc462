//! The cache controller: generation lifecycle plus per-request routing.
//!
//! Install strictly precedes activate, which strictly precedes serving, for
//! any given generation. Serving applies one freshness strategy per routing
//! class: remote-API traffic is never intercepted, navigations are
//! Network-First with the cached entry point as fallback, and subresources
//! are Stale-While-Revalidate.

use crate::manifest::AssetManifest;
use crate::request::{AssetRequest, CapturedResponse};
use crate::routes::{RouteClass, classify};
use crate::store::AssetStore;
use crate::transport::Transport;
use std::sync::Arc;
use stash_core::{AppConfig, Error};
use tokio::task::JoinHandle;
use url::Url;

/// Controller wiring: where the shell lives, which host to bypass, and which
/// cached page to fall back to when a navigation fails offline.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Origin the application shell is served from.
    pub origin: Url,
    /// Remote data service host; requests there bypass the cache.
    pub api_host: String,
    /// Path of the entry-point page used as the navigation fallback.
    pub entry_point: String,
}

impl ControllerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.app_origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { origin, api_host: config.api_host.clone(), entry_point: config.entry_point.clone() })
    }
}

/// Result of routing one request.
///
/// When the Stale-While-Revalidate path spawned a background refresh, its
/// join handle rides along; dropping it detaches the task, awaiting it makes
/// the revalidation observable (tests rely on that).
#[derive(Debug)]
pub struct Served {
    pub response: CapturedResponse,
    pub revalidation: Option<JoinHandle<()>>,
}

impl Served {
    fn direct(response: CapturedResponse) -> Self {
        Self { response, revalidation: None }
    }

    pub fn into_response(self) -> CapturedResponse {
        self.response
    }
}

/// Intercepts outbound requests for the application shell and keeps the
/// asset cache's generation consistent with the deployed asset set.
pub struct CacheController {
    store: AssetStore,
    transport: Arc<dyn Transport>,
    config: ControllerConfig,
}

impl CacheController {
    pub fn new(store: AssetStore, transport: Arc<dyn Transport>, config: ControllerConfig) -> Self {
        Self { store, transport, config }
    }

    /// Fetch and stage every asset in the manifest under its generation.
    ///
    /// Atomic: any fetch failure or non-success status aborts the whole
    /// install and nothing is written, leaving the previously active
    /// generation authoritative.
    pub async fn install(&self, manifest: &AssetManifest) -> Result<(), Error> {
        let mut entries = Vec::with_capacity(manifest.paths.len());
        for path in &manifest.paths {
            let url = self
                .config
                .origin
                .join(path)
                .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
            let req = AssetRequest::get(url);
            let response = self
                .transport
                .fetch(&req)
                .await
                .map_err(|e| Error::ManifestFetch { path: path.clone(), reason: e.to_string() })?;
            if !response.is_success() {
                return Err(Error::ManifestFetch {
                    path: path.clone(),
                    reason: format!("status {}", response.status),
                });
            }
            entries.push((req.identity(), req.url.to_string(), response));
        }

        self.store.install_generation(&manifest.generation, entries).await?;
        tracing::info!(
            generation = %manifest.generation,
            assets = manifest.paths.len(),
            "installed cache generation"
        );
        Ok(())
    }

    /// Take over serving with `generation`, purging every other generation.
    pub async fn activate(&self, generation: &str) -> Result<u64, Error> {
        let purged = self.store.activate(generation).await?;
        tracing::info!(generation, purged, "activated cache generation");
        Ok(purged)
    }

    /// Route one intercepted request through its freshness strategy.
    pub async fn handle(&self, req: AssetRequest) -> Result<Served, Error> {
        match classify(&req, &self.config.api_host) {
            RouteClass::RemoteApi | RouteClass::Passthrough => {
                // No caching decision at all: straight to the network.
                Ok(Served::direct(self.transport.fetch(&req).await?))
            }
            RouteClass::Navigation => self.serve_navigation(&req).await,
            RouteClass::Asset => self.serve_asset(req).await,
        }
    }

    /// Network-First: prefer the live response, fall back to the cached
    /// entry-point page on any network failure.
    async fn serve_navigation(&self, req: &AssetRequest) -> Result<Served, Error> {
        match self.transport.fetch(req).await {
            Ok(response) => Ok(Served::direct(response)),
            Err(err) => {
                let fallback = self.entry_point_identity()?;
                match self.store.get(&fallback).await? {
                    Some(cached) => {
                        tracing::debug!(url = %req.url, error = %err, "navigation offline, serving cached shell");
                        Ok(Served::direct(cached))
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Stale-While-Revalidate: a cache hit returns immediately while a
    /// detached task refreshes the entry; a miss waits on the network.
    async fn serve_asset(&self, req: AssetRequest) -> Result<Served, Error> {
        let identity = req.identity();
        match self.store.get(&identity).await? {
            Some(cached) => {
                let revalidation = self.spawn_revalidation(req);
                Ok(Served { response: cached, revalidation: Some(revalidation) })
            }
            None => {
                let response = self.transport.fetch(&req).await?;
                self.store.put(&identity, req.url.as_str(), &response).await?;
                Ok(Served::direct(response))
            }
        }
    }

    /// Refresh one cache entry in the background. Failures are absorbed
    /// here; the caller already holds a valid stale response.
    fn spawn_revalidation(&self, req: AssetRequest) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let store = self.store.clone();
        tokio::spawn(async move {
            let identity = req.identity();
            match transport.fetch(&req).await {
                Ok(response) => {
                    if let Err(err) = store.put(&identity, req.url.as_str(), &response).await {
                        tracing::warn!(identity, error = %err, "failed to commit revalidated entry");
                    }
                }
                Err(err) => {
                    tracing::debug!(identity, error = %err, "background revalidation failed");
                }
            }
        })
    }

    fn entry_point_identity(&self) -> Result<String, Error> {
        let url = self
            .config
            .origin
            .join(&self.config.entry_point)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(format!("GET {url}"))
    }
}
