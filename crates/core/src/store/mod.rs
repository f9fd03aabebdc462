//! SQLite-backed local durable store.
//!
//! Two tables back the offline experience: a mirror of recently saved article
//! records for reads without connectivity, and an append-only queue of writes
//! made while disconnected. Access is async via tokio-rusqlite, which runs
//! database work on a background thread. It supports:
//!
//! - Automatic schema migrations (pending writes survive version bumps)
//! - WAL mode for concurrent access
//! - A shared open handle so concurrent callers negotiate the schema
//!   upgrade exactly once

pub mod articles;
pub mod connection;
pub mod migrations;
pub mod pending;

pub use crate::Error;

pub use articles::Article;
pub use connection::{LocalStore, SharedStore};
pub use pending::PendingWrite;
