//! Error types for the local store.

use crate::record::{Collection, IndexField, OrderField};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while opening, reading or writing the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] lexicache_storage::StorageError),

    /// I/O error outside the backend (directory or lock handling).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store has not been opened yet.
    #[error("local store is not open")]
    NotOpen,

    /// Another process holds the store directory lock.
    #[error("store at {path} is locked by another process")]
    Locked {
        /// Store directory.
        path: PathBuf,
    },

    /// The store directory is missing and creation was disabled.
    #[error("store directory does not exist: {path}")]
    MissingDirectory {
        /// Expected directory.
        path: PathBuf,
    },

    /// A journal frame could not be parsed.
    #[error("journal corruption at offset {offset}: {message}")]
    JournalCorruption {
        /// Offset of the offending frame.
        offset: u64,
        /// Description of the problem.
        message: String,
    },

    /// A journal frame failed its checksum.
    #[error("journal checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Offset of the offending frame.
        offset: u64,
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// A record or metadata payload could not be encoded.
    #[error("failed to encode {what}: {message}")]
    Encode {
        /// What was being encoded.
        what: &'static str,
        /// Encoder message.
        message: String,
    },

    /// A record with the same key already exists in this generation.
    #[error("duplicate key {key:?} in {collection}")]
    DuplicateKey {
        /// Target collection.
        collection: Collection,
        /// Offending key.
        key: String,
    },

    /// The collection has no secondary index on the requested field.
    #[error("{collection} has no index on {field}")]
    UnsupportedIndex {
        /// Queried collection.
        collection: Collection,
        /// Requested field.
        field: IndexField,
    },

    /// A store task on the blocking thread pool panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The collection cannot be ordered by the requested field.
    #[error("{collection} cannot be ordered by {field}")]
    UnsupportedOrder {
        /// Queried collection.
        collection: Collection,
        /// Requested field.
        field: OrderField,
    },
}

impl StoreError {
    pub(crate) fn corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::JournalCorruption {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn encode(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            what,
            message: err.to_string(),
        }
    }

    /// Returns true if the error means the persisted journal is damaged and
    /// the cache has to be cleared and downloaded again.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::JournalCorruption { .. } | Self::ChecksumMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corruption_is_classified() {
        assert!(StoreError::corruption(8, "bad magic").is_corruption());
        assert!(StoreError::ChecksumMismatch {
            offset: 0,
            expected: 1,
            actual: 2
        }
        .is_corruption());
        assert!(!StoreError::NotOpen.is_corruption());
    }

    #[test]
    fn messages_name_the_collection() {
        let err = StoreError::DuplicateKey {
            collection: Collection::Entries,
            key: "hello".into(),
        };
        assert_eq!(err.to_string(), "duplicate key \"hello\" in entries");

        let err = StoreError::UnsupportedIndex {
            collection: Collection::Categories,
            field: IndexField::CategoryId,
        };
        assert_eq!(err.to_string(), "categories has no index on category_id");
    }
}
