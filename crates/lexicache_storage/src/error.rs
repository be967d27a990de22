//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by byte-store backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested range is not inside the store.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: usize,
        /// Store size at the time of the read.
        size: u64,
    },

    /// Truncation target lies past the end of the store.
    #[error("cannot truncate to {requested} bytes, store holds {size}")]
    TruncateBeyondEnd {
        /// Requested new size.
        requested: u64,
        /// Current size.
        size: u64,
    },

    /// The store is too large to be addressed in memory on this platform.
    #[error("storage of {size} bytes cannot be loaded into memory")]
    TooLarge {
        /// Store size.
        size: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_offsets() {
        let err = StorageError::ReadPastEnd {
            offset: 12,
            len: 4,
            size: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("10"));

        let err = StorageError::TruncateBeyondEnd {
            requested: 50,
            size: 8,
        };
        assert_eq!(err.to_string(), "cannot truncate to 50 bytes, store holds 8");
    }
}
