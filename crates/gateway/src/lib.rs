//! Offline-first asset gateway for the stash application shell.
//!
//! This crate fronts every outbound request the shell makes and applies one
//! freshness strategy per routing class:
//!
//! - Remote data service traffic passes straight through, uncached
//! - Navigations are Network-First with the cached entry page as fallback
//! - Static subresources are Stale-While-Revalidate
//!
//! Cached responses live in a generation-scoped SQLite namespace; a new
//! deployment installs a fresh generation atomically and activating it
//! garbage-collects every previous one.

pub mod controller;
pub mod manifest;
pub mod request;
pub mod routes;
pub mod store;
pub mod transport;

pub use controller::{CacheController, ControllerConfig, Served};
pub use manifest::{AssetManifest, SHELL_ASSETS};
pub use request::{AssetRequest, CapturedResponse, RequestMode};
pub use routes::{RouteClass, classify};
pub use store::AssetStore;
pub use transport::{HttpTransport, Transport, TransportConfig};

pub use stash_core::Error;
