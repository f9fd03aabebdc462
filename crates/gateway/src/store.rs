//! Generation-scoped persistence for captured asset responses.
//!
//! The gateway owns this SQLite namespace exclusively; it is separate from
//! the durable store's namespace and the two never share a connection. Rows
//! are keyed by request identity and tagged with the cache generation they
//! were installed or revalidated under. Entries are only ever removed
//! wholesale, when activating a new generation.

use crate::request::CapturedResponse;
use bytes::Bytes;
use std::path::Path;
use stash_core::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS asset_entries (
        identity TEXT PRIMARY KEY,
        url TEXT NOT NULL,
        status INTEGER NOT NULL,
        headers_json TEXT NOT NULL,
        body BLOB NOT NULL,
        generation TEXT NOT NULL,
        stored_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_asset_entries_generation
        ON asset_entries(generation);
    CREATE TABLE IF NOT EXISTS cache_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Asset cache handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Cloning is cheap and shares the same connection.
#[derive(Clone, Debug)]
pub struct AssetStore {
    conn: Connection,
}

/// One staged entry for [`AssetStore::install_generation`]:
/// (request identity, url, captured response).
pub type InstallEntry = (String, String, CapturedResponse);

impl AssetStore {
    /// Open the asset cache at the specified path, creating it if absent.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Storage(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory asset cache for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Storage(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;",
            )?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(Error::Storage)?;

        Ok(Self { conn })
    }

    /// The generation currently authoritative for serving, if any.
    pub async fn active_generation(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT value FROM cache_meta WHERE key = 'active_generation'",
                    [],
                    |row| row.get(0),
                );
                match result {
                    Ok(generation) => Ok(Some(generation)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Write a freshly fetched generation's entry set in one transaction.
    ///
    /// Either every entry lands or none does; the generation is not yet
    /// active, so serving continues from the previous one. Re-installing the
    /// same generation replaces its staged entries.
    pub async fn install_generation(&self, generation: &str, entries: Vec<InstallEntry>) -> Result<(), Error> {
        let generation = generation.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM asset_entries WHERE generation = ?1", params![generation])?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO asset_entries
                            (identity, url, status, headers_json, body, generation, stored_at)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                        ON CONFLICT(identity) DO UPDATE SET
                            url = excluded.url,
                            status = excluded.status,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            generation = excluded.generation,
                            stored_at = excluded.stored_at",
                    )?;
                    for (identity, url, response) in &entries {
                        let headers_json = serde_json::to_string(&response.headers)
                            .map_err(|e| Error::InvalidPayload(e.to_string()))?;
                        stmt.execute(params![
                            identity,
                            url,
                            response.status,
                            headers_json,
                            response.body.as_ref(),
                            generation,
                            stored_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Make `generation` authoritative and garbage-collect every other one.
    ///
    /// Both steps commit in a single transaction, so no reader ever observes
    /// a half-activated cache. Returns the number of purged entries.
    pub async fn activate(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO cache_meta (key, value) VALUES ('active_generation', ?1)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![generation],
                )?;
                let purged =
                    tx.execute("DELETE FROM asset_entries WHERE generation != ?1", params![generation])?;
                tx.commit()?;
                Ok(purged as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the cached response for a request identity.
    pub async fn get(&self, identity: &str) -> Result<Option<CapturedResponse>, Error> {
        let identity = identity.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CapturedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body FROM asset_entries WHERE identity = ?1",
                )?;

                let result = stmt.query_row(params![identity], |row| {
                    Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?))
                });

                match result {
                    Ok((status, headers_json, body)) => {
                        let headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::InvalidPayload(e.to_string()))?;
                        Ok(Some(CapturedResponse { status, headers, body: Bytes::from(body) }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Overwrite one entry under the active generation.
    ///
    /// This is the revalidation commit path. Returns false (and writes
    /// nothing) when no generation has been activated yet.
    pub async fn put(&self, identity: &str, url: &str, response: &CapturedResponse) -> Result<bool, Error> {
        let headers_json = serde_json::to_string(&response.headers)?;
        let identity = identity.to_string();
        let url = url.to_string();
        let status = response.status;
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<bool, Error> {
                // Read the active generation and commit the entry in one
                // transaction so a concurrent activate cannot interleave.
                let tx = conn.transaction()?;
                let generation: Option<String> = match tx.query_row(
                    "SELECT value FROM cache_meta WHERE key = 'active_generation'",
                    [],
                    |row| row.get(0),
                ) {
                    Ok(generation) => Some(generation),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e.into()),
                };
                let Some(generation) = generation else {
                    tracing::debug!(identity, "no active generation, skipping cache write");
                    return Ok(false);
                };

                tx.execute(
                    "INSERT INTO asset_entries
                        (identity, url, status, headers_json, body, generation, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(identity) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        generation = excluded.generation,
                        stored_at = excluded.stored_at",
                    params![identity, url, status, headers_json, body, generation, stored_at],
                )?;
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(Error::from)
    }

    /// Total number of cached entries, across all generations.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM asset_entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Distinct generations with at least one entry. Mostly for inspection.
    pub async fn generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT DISTINCT generation FROM asset_entries ORDER BY generation")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let mut generations = Vec::new();
                for row in rows {
                    generations.push(row?);
                }
                Ok(generations)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> CapturedResponse {
        CapturedResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: Bytes::from(body.to_string()),
        }
    }

    fn entry(identity: &str, body: &str) -> InstallEntry {
        let url = identity.trim_start_matches("GET ").to_string();
        (identity.to_string(), url, response(body))
    }

    #[tokio::test]
    async fn test_install_then_get() {
        let store = AssetStore::open_in_memory().await.unwrap();
        store
            .install_generation("stash-v1", vec![entry("GET https://app.example/app.js", "console.log(1)")])
            .await
            .unwrap();

        let cached = store.get("GET https://app.example/app.js").await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from("console.log(1)"));
        assert_eq!(cached.header("content-type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_activate_purges_other_generations() {
        let store = AssetStore::open_in_memory().await.unwrap();
        store
            .install_generation("stash-v1", vec![entry("GET https://app.example/old.js", "old")])
            .await
            .unwrap();
        store.activate("stash-v1").await.unwrap();

        store
            .install_generation("stash-v2", vec![entry("GET https://app.example/new.js", "new")])
            .await
            .unwrap();
        let purged = store.activate("stash-v2").await.unwrap();

        assert_eq!(purged, 1);
        assert!(store.get("GET https://app.example/old.js").await.unwrap().is_none());
        assert!(store.get("GET https://app.example/new.js").await.unwrap().is_some());
        assert_eq!(store.generations().await.unwrap(), vec!["stash-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_put_requires_active_generation() {
        let store = AssetStore::open_in_memory().await.unwrap();
        let written = store
            .put("GET https://app.example/a.js", "https://app.example/a.js", &response("a"))
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(store.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_overwrites_entry() {
        let store = AssetStore::open_in_memory().await.unwrap();
        store
            .install_generation("stash-v1", vec![entry("GET https://app.example/a.js", "stale")])
            .await
            .unwrap();
        store.activate("stash-v1").await.unwrap();

        let written = store
            .put("GET https://app.example/a.js", "https://app.example/a.js", &response("fresh"))
            .await
            .unwrap();
        assert!(written);

        let cached = store.get("GET https://app.example/a.js").await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from("fresh"));
        assert_eq!(store.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reinstall_replaces_staged_entries() {
        let store = AssetStore::open_in_memory().await.unwrap();
        store
            .install_generation("stash-v1", vec![entry("GET https://app.example/a.js", "first")])
            .await
            .unwrap();
        store
            .install_generation("stash-v1", vec![entry("GET https://app.example/b.js", "second")])
            .await
            .unwrap();

        assert!(store.get("GET https://app.example/a.js").await.unwrap().is_none());
        assert!(store.get("GET https://app.example/b.js").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.sqlite");

        {
            let store = AssetStore::open(&path).await.unwrap();
            store
                .install_generation("stash-v1", vec![entry("GET https://app.example/a.js", "kept")])
                .await
                .unwrap();
            store.activate("stash-v1").await.unwrap();
        }

        let reopened = AssetStore::open(&path).await.unwrap();
        assert_eq!(reopened.active_generation().await.unwrap().as_deref(), Some("stash-v1"));
        let cached = reopened.get("GET https://app.example/a.js").await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from("kept"));
    }
}
