//! Contract for the hosted remote data service.
//!
//! The backend itself (auth, row storage, object storage) lives outside this
//! layer; everything here consumes it through this trait so the store and the
//! reconciliation pass can be exercised against a fake in tests.

use crate::Error;
use crate::store::Article;
use async_trait::async_trait;

/// Request/response surface of the hosted backend.
///
/// Implementations should return [`Error::Network`] for connectivity-level
/// failures (offline, DNS, timeout) and [`Error::RemoteRejected`] when the
/// service reached the backend but the backend refused the operation. The
/// reconciliation pass treats the two very differently.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// Insert one saved-content record; returns the remote identifier.
    async fn insert_record(&self, payload: &serde_json::Value) -> Result<String, Error>;

    /// Point lookup of a single record.
    async fn get_record(&self, id: &str) -> Result<Option<Article>, Error>;

    /// The most recently saved records, newest first, at most `limit`.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Article>, Error>;

    /// Upload an object (e.g. a captured page image); returns its URL.
    async fn upload_object(&self, path: &str, bytes: &[u8]) -> Result<String, Error>;
}
