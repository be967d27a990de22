//! The dataset snapshot wire format.
//!
//! The origin serves the whole dataset as one JSON document:
//!
//! ```json
//! {
//!   "version": 1705555200000,
//!   "tables": { "entries": [...], "categories": [...], "conversations": [...] },
//!   "meta": { "entriesCount": 1, "categoriesCount": 1, "conversationsCount": 1 }
//! }
//! ```

use crate::record::{CacheMeta, Category, Conversation, Entry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A complete, versioned dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    /// Logical clock of the dataset; larger is newer.
    pub version: u64,
    /// The three record collections.
    pub tables: SnapshotTables,
    /// Counts as reported by the origin.
    pub meta: SnapshotCounts,
}

/// Record collections of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTables {
    /// Entry rows.
    pub entries: Vec<Entry>,
    /// Category rows.
    pub categories: Vec<Category>,
    /// Conversation rows.
    pub conversations: Vec<Conversation>,
}

/// Record counts reported alongside a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCounts {
    /// Number of entries.
    pub entries_count: u64,
    /// Number of categories.
    pub categories_count: u64,
    /// Number of conversations.
    pub conversations_count: u64,
}

impl SnapshotCounts {
    /// Counts taken from the tables themselves.
    #[must_use]
    pub fn of(tables: &SnapshotTables) -> Self {
        Self {
            entries_count: tables.entries.len() as u64,
            categories_count: tables.categories.len() as u64,
            conversations_count: tables.conversations.len() as u64,
        }
    }
}

impl DatasetSnapshot {
    /// Builds a snapshot whose counts match its tables.
    #[must_use]
    pub fn new(version: u64, tables: SnapshotTables) -> Self {
        let meta = SnapshotCounts::of(&tables);
        Self {
            version,
            tables,
            meta,
        }
    }

    /// Decodes a snapshot from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Encodes the snapshot as JSON.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Cache metadata recording this snapshot as applied at `at`.
    ///
    /// Counts come from the snapshot's `meta` block, not from the tables.
    #[must_use]
    pub fn cache_meta(&self, at: DateTime<Utc>) -> CacheMeta {
        CacheMeta {
            version: self.version,
            downloaded_at: at,
            entries_count: self.meta.entries_count,
            categories_count: self.meta.categories_count,
            conversations_count: self.meta.conversations_count,
        }
    }
}
