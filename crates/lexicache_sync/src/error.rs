//! Error types for the sync adapters.

use lexicache_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while initializing or downloading the cache.
///
/// Reads never produce these: an adapter that cannot serve a read answers
/// with an empty result instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The local store failed to open or to write.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// The origin could not be reached or answered with a failure status.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// HTTP status, when the origin answered.
        status: Option<u16>,
    },

    /// The downloaded body is not a valid dataset snapshot.
    #[error("malformed dataset snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    /// This adapter has no durable store to download into.
    #[error("offline cache is not available in this environment")]
    Unavailable,
}

impl SyncError {
    /// Creates a network error without a status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a network error for a non-success response.
    pub fn http_status(status: u16, reason: &str) -> Self {
        Self::Network {
            message: format!("origin answered {status} {reason}"),
            status: Some(status),
        }
    }

    /// Returns true for transport failures and failure statuses.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}
