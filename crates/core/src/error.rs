//! Unified error types for the offline resilience layer.
//!
//! One enum covers both subsystems: storage failures from the durable store,
//! network failures from the asset gateway, and the install-time manifest
//! failure that must abort a cache generation atomically.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the durable store and the asset gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transient network failure (offline, DNS, timeout). Recoverable by
    /// serving from cache or leaving the write queued.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Persistent-storage transaction failed. Always surfaced to the caller;
    /// a lost read or write is never silently dropped.
    #[error("STORAGE_ERROR: {0}")]
    Storage(tokio_rusqlite::Error),

    /// Schema migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// An install-time asset fetch failed. The whole install aborts and the
    /// previously active generation stays authoritative.
    #[error("MANIFEST_FETCH_FAILED: {path}: {reason}")]
    ManifestFetch { path: String, reason: String },

    /// A URL could not be parsed or resolved against the configured origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A pending-write payload could not be encoded or decoded.
    #[error("INVALID_PAYLOAD: {0}")]
    InvalidPayload(String),

    /// The remote data service refused a record during reconciliation.
    #[error("REMOTE_REJECTED: {0}")]
    RemoteRejected(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Storage(tokio_rusqlite::Error::Close(c)),
            _ => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Storage(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidPayload(err.to_string())
    }
}
