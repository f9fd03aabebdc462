//! Core types and shared functionality for the stash offline layer.
//!
//! This crate provides:
//! - The local durable store (article mirror + pending-write queue) on SQLite
//! - Unified error types
//! - Configuration structures
//! - The remote data service contract and the reconciliation pass over it

pub mod config;
pub mod error;
pub mod remote;
pub mod store;
pub mod sync;

pub use config::AppConfig;
pub use error::Error;
pub use remote::RemoteDataService;
pub use store::{Article, LocalStore, PendingWrite, SharedStore};
