//! Store connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for performance and concurrency (WAL mode), and running migrations. It also
//! provides [`SharedStore`], a memoized open so that every concurrent caller
//! awaits the same initialization and observes one underlying connection.

use super::migrations;
use crate::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_rusqlite::Connection;

/// Durable store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Cloning is cheap and shares the same connection.
#[derive(Clone, Debug)]
pub struct LocalStore {
    pub(crate) conn: Connection,
}

impl LocalStore {
    /// Open the store at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Storage(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory store for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same pragma
    /// configuration as file-based stores.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Storage(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Storage)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

/// Lazily-opened, process-wide store handle.
///
/// Opening a versioned store from multiple contexts concurrently can race on
/// the schema upgrade, so all callers share one initialization: the first
/// `get` opens the store, every other caller awaits that same future and
/// receives a clone of the same connection.
#[derive(Clone, Debug)]
pub struct SharedStore {
    path: PathBuf,
    cell: Arc<OnceCell<LocalStore>>,
}

impl SharedStore {
    /// Create a handle for the store at `path` without opening it yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cell: Arc::new(OnceCell::new()) }
    }

    /// Open the store if this is the first caller, otherwise return the
    /// already-open connection. Safe to call concurrently.
    pub async fn get(&self) -> Result<LocalStore, Error> {
        let store = self.cell.get_or_try_init(|| LocalStore::open(&self.path)).await?;
        Ok(store.clone())
    }
}
