//! Pending-write queue operations.
//!
//! Saves and highlights made while disconnected are appended here and drained
//! by the reconciliation pass once connectivity returns. A queued record is
//! never deleted until the remote data service has durably accepted it.

use super::connection::LocalStore;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// One write buffered while offline.
///
/// `seq` is a local sequence number, assigned monotonically in call order and
/// never reused; it is distinct from whatever identifier the remote service
/// assigns on acceptance. The payload is opaque to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingWrite {
    pub seq: i64,
    pub payload: serde_json::Value,
    pub created_at: String,
}

impl LocalStore {
    /// Append one record to the pending-write queue.
    ///
    /// Commits atomically and returns the assigned sequence number; once this
    /// returns the record survives a page close or process restart.
    pub async fn enqueue_pending_write(&self, payload: &serde_json::Value) -> Result<i64, Error> {
        let payload = serde_json::to_string(payload)?;
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO pending_writes (payload, created_at) VALUES (?1, ?2)",
                    params![payload, created_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// List all queued writes in sequence order.
    pub async fn list_pending_writes(&self) -> Result<Vec<PendingWrite>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PendingWrite>, Error> {
                let mut stmt =
                    conn.prepare("SELECT seq, payload, created_at FROM pending_writes ORDER BY seq")?;

                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })?;

                let mut writes = Vec::new();
                for row in rows {
                    let (seq, payload, created_at) = row?;
                    let payload = serde_json::from_str(&payload)
                        .map_err(|e| Error::InvalidPayload(e.to_string()))?;
                    writes.push(PendingWrite { seq, payload, created_at });
                }
                Ok(writes)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a queued write after the remote service confirmed it.
    ///
    /// Returns false if no record with that sequence number exists.
    pub async fn remove_pending_write(&self, seq: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let changed = conn.execute("DELETE FROM pending_writes WHERE seq = ?1", params![seq])?;
                Ok(changed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of writes still awaiting reconciliation.
    pub async fn pending_write_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM pending_writes", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_enqueue_assigns_sequential_numbers() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let first = store
            .enqueue_pending_write(&json!({"url": "https://x.com", "highlight": "abc"}))
            .await
            .unwrap();
        let second = store
            .enqueue_pending_write(&json!({"url": "https://x.com", "highlight": "abc"}))
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let queued = store.list_pending_writes().await.unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].seq, 1);
        assert_eq!(queued[1].seq, 2);
    }

    #[tokio::test]
    async fn test_payload_round_trips_opaquely() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let payload = json!({"url": "https://x.com", "highlight": "abc", "tags": ["a", "b"]});
        store.enqueue_pending_write(&payload).await.unwrap();

        let queued = store.list_pending_writes().await.unwrap();
        assert_eq!(queued[0].payload, payload);
    }

    #[tokio::test]
    async fn test_queue_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stash.sqlite");
        let payload = json!({"url": "https://x.com", "highlight": "abc"});

        let created_at = {
            let store = LocalStore::open(&path).await.unwrap();
            store.enqueue_pending_write(&payload).await.unwrap();
            store.list_pending_writes().await.unwrap()[0].created_at.clone()
        };

        let reopened = LocalStore::open(&path).await.unwrap();
        let queued = reopened.list_pending_writes().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].payload, payload);
        assert_eq!(queued[0].created_at, created_at);
    }

    #[tokio::test]
    async fn test_sequence_numbers_never_reused() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let first = store.enqueue_pending_write(&json!({"n": 1})).await.unwrap();
        let second = store.enqueue_pending_write(&json!({"n": 2})).await.unwrap();

        assert!(store.remove_pending_write(second).await.unwrap());

        let third = store.enqueue_pending_write(&json!({"n": 3})).await.unwrap();
        assert!(third > second);
        assert_ne!(third, second);
        assert_ne!(third, first);
    }

    #[tokio::test]
    async fn test_remove_missing_returns_false() {
        let store = LocalStore::open_in_memory().await.unwrap();
        assert!(!store.remove_pending_write(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_write_count() {
        let store = LocalStore::open_in_memory().await.unwrap();
        assert_eq!(store.pending_write_count().await.unwrap(), 0);
        store.enqueue_pending_write(&json!({})).await.unwrap();
        assert_eq!(store.pending_write_count().await.unwrap(), 1);
    }
}
