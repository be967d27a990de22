//! # Lexicache Store
//!
//! The typed, indexed on-device table set behind the lexicache offline
//! cache.
//!
//! This crate provides:
//! - Record types for entries, categories, conversations and cache metadata
//! - An append-only, checksummed journal that survives restarts
//! - Key, secondary-index and ordered lookups over in-memory tables
//! - The dataset snapshot wire format
//! - Locale helpers that decode the JSON embedded in records
//!
//! The store knows nothing about the network. Filling it is the job of the
//! sync adapter.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod error;
mod journal;
mod locale;
mod record;
mod snapshot;
mod store;
mod table;

pub use config::{StoreConfig, StoreLocation, DEFAULT_BATCH_SIZE};
pub use error::{StoreError, StoreResult};
pub use journal::{FrameKind, JournalRecord, JournalStats, RecordBatch, FRAME_MAGIC, FRAME_VERSION};
pub use locale::{DialogueTurn, Examples, Locale, LocalizedEntry, Translation};
pub use record::{CacheMeta, Category, Collection, Conversation, Entry, IndexField, OrderField, Record};
pub use snapshot::{DatasetSnapshot, SnapshotCounts, SnapshotTables};
pub use store::LocalStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
