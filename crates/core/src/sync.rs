//! Reconciliation between the local durable store and the remote service.
//!
//! Two passes run when connectivity returns: draining the pending-write queue
//! in sequence order, and refreshing the mirror table from the remote's most
//! recent records. A queued write is only removed after the remote service
//! durably accepted it.

use crate::Error;
use crate::remote::RemoteDataService;
use crate::store::LocalStore;

/// What to do with a queued write the remote service rejected outright.
///
/// Network-level failures always leave the record queued; this policy only
/// applies when the backend was reachable and said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionPolicy {
    /// Leave the record in the queue for a later attempt.
    Keep,
    /// Drop the record; the rejection is treated as permanent.
    Discard,
}

/// Outcome of one drain pass over the pending-write queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Records the remote service accepted and the queue released.
    pub flushed: u64,
    /// Rejected records removed under [`RejectionPolicy::Discard`].
    pub discarded: u64,
    /// Records still queued when the pass ended.
    pub deferred: u64,
}

/// Drain the pending-write queue in sequence order.
///
/// Each record is submitted via [`RemoteDataService::insert_record`]; on
/// acceptance it is removed from the queue. A transient network failure stops
/// the pass immediately, leaving the remainder queued for the next attempt.
/// A non-network rejection is handled per `policy` and the pass continues.
pub async fn drain_pending(
    store: &LocalStore, remote: &dyn RemoteDataService, policy: RejectionPolicy,
) -> Result<DrainOutcome, Error> {
    let queued = store.list_pending_writes().await?;
    let total = queued.len() as u64;
    let mut outcome = DrainOutcome::default();

    for write in queued {
        match remote.insert_record(&write.payload).await {
            Ok(remote_id) => {
                store.remove_pending_write(write.seq).await?;
                outcome.flushed += 1;
                tracing::debug!(seq = write.seq, %remote_id, "flushed pending write");
            }
            Err(Error::Network(reason)) => {
                tracing::info!(seq = write.seq, %reason, "connectivity lost mid-drain, deferring remainder");
                break;
            }
            Err(err) => match policy {
                RejectionPolicy::Keep => {
                    tracing::warn!(seq = write.seq, error = %err, "remote rejected pending write, keeping");
                }
                RejectionPolicy::Discard => {
                    store.remove_pending_write(write.seq).await?;
                    outcome.discarded += 1;
                    tracing::warn!(seq = write.seq, error = %err, "remote rejected pending write, discarding");
                }
            },
        }
    }

    outcome.deferred = total - outcome.flushed - outcome.discarded;
    Ok(outcome)
}

/// Refresh the mirror table from the remote service's most recent records.
///
/// Returns how many records were upserted. On any remote failure the mirror
/// is left untouched.
pub async fn refresh_mirror(
    store: &LocalStore, remote: &dyn RemoteDataService, limit: usize,
) -> Result<usize, Error> {
    let records = remote.list_recent(limit).await?;
    store.replace_articles(&records).await?;
    tracing::debug!(count = records.len(), "refreshed article mirror");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Article;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake backend: accepts everything until `fail_after` submissions, then
    /// returns the configured error for the rest.
    struct FakeRemote {
        accepted: Mutex<Vec<serde_json::Value>>,
        calls: AtomicUsize,
        fail_after: usize,
        failure: fn(usize) -> Error,
        recent: Vec<Article>,
    }

    impl FakeRemote {
        fn accepting() -> Self {
            Self {
                accepted: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_after: usize::MAX,
                failure: |_| unreachable!(),
                recent: Vec::new(),
            }
        }

        fn failing_after(fail_after: usize, failure: fn(usize) -> Error) -> Self {
            Self { fail_after, failure, ..Self::accepting() }
        }
    }

    #[async_trait]
    impl RemoteDataService for FakeRemote {
        async fn insert_record(&self, payload: &serde_json::Value) -> Result<String, Error> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.fail_after {
                return Err((self.failure)(n));
            }
            self.accepted.lock().unwrap().push(payload.clone());
            Ok(format!("remote-{n}"))
        }

        async fn get_record(&self, _id: &str) -> Result<Option<Article>, Error> {
            Ok(None)
        }

        async fn list_recent(&self, limit: usize) -> Result<Vec<Article>, Error> {
            Ok(self.recent.iter().take(limit).cloned().collect())
        }

        async fn upload_object(&self, path: &str, _bytes: &[u8]) -> Result<String, Error> {
            Ok(format!("https://objects.example/{path}"))
        }
    }

    async fn store_with_queue(n: usize) -> LocalStore {
        let store = LocalStore::open_in_memory().await.unwrap();
        for i in 0..n {
            store.enqueue_pending_write(&json!({"n": i})).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_drain_flushes_in_sequence_order() {
        let store = store_with_queue(3).await;
        let remote = FakeRemote::accepting();

        let outcome = drain_pending(&store, &remote, RejectionPolicy::Keep).await.unwrap();

        assert_eq!(outcome, DrainOutcome { flushed: 3, discarded: 0, deferred: 0 });
        assert_eq!(store.pending_write_count().await.unwrap(), 0);

        let accepted = remote.accepted.lock().unwrap();
        assert_eq!(accepted[0], json!({"n": 0}));
        assert_eq!(accepted[2], json!({"n": 2}));
    }

    #[tokio::test]
    async fn test_network_failure_defers_remainder() {
        let store = store_with_queue(4).await;
        let remote = FakeRemote::failing_after(2, |_| Error::Network("offline again".to_string()));

        let outcome = drain_pending(&store, &remote, RejectionPolicy::Keep).await.unwrap();

        assert_eq!(outcome.flushed, 2);
        assert_eq!(outcome.deferred, 2);
        // The deferred records stay queued with their sequence intact.
        let queued = store.list_pending_writes().await.unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].seq, 3);
    }

    #[tokio::test]
    async fn test_rejection_discard_removes_record() {
        let store = store_with_queue(3).await;
        let remote = FakeRemote::failing_after(1, |_| Error::RemoteRejected("duplicate".to_string()));

        let outcome = drain_pending(&store, &remote, RejectionPolicy::Discard).await.unwrap();

        assert_eq!(outcome.flushed, 1);
        assert_eq!(outcome.discarded, 2);
        assert_eq!(store.pending_write_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejection_keep_leaves_record_queued() {
        let store = store_with_queue(2).await;
        let remote = FakeRemote::failing_after(1, |_| Error::RemoteRejected("schema".to_string()));

        let outcome = drain_pending(&store, &remote, RejectionPolicy::Keep).await.unwrap();

        assert_eq!(outcome.flushed, 1);
        assert_eq!(outcome.deferred, 1);
        assert_eq!(store.pending_write_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_mirror_upserts_window() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let mut remote = FakeRemote::accepting();
        remote.recent = vec![Article {
            id: "a1".to_string(),
            title: "Title".to_string(),
            content: "<p>Body</p>".to_string(),
            excerpt: "Body".to_string(),
            site_name: "example.com".to_string(),
            author: None,
            published_at: None,
            image_url: None,
        }];

        let count = refresh_mirror(&store, &remote, 20).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.list_articles().await.unwrap().len(), 1);
    }
}
