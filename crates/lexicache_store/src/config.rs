//! Local store configuration.

use lexicache_storage::InMemoryBackend;
use std::path::{Path, PathBuf};

/// Default number of records per journal transaction.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Where the store keeps its journal.
#[derive(Debug, Clone)]
pub enum StoreLocation {
    /// A volatile in-memory journal.
    ///
    /// Clones of an [`InMemoryBackend`] share bytes, so two stores built from
    /// the same location see the same journal.
    InMemory(InMemoryBackend),
    /// A directory on disk holding `LOCK` and `journal.log`.
    Directory(PathBuf),
}

impl StoreLocation {
    /// A fresh, empty in-memory location.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryBackend::new())
    }

    /// The directory, for on-disk locations.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::InMemory(_) => None,
            Self::Directory(path) => Some(path),
        }
    }
}

/// Configuration for a [`LocalStore`](crate::LocalStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Journal location.
    pub location: StoreLocation,

    /// Records per journal transaction, both in
    /// [`replace_all`](crate::LocalStore::replace_all) and when a download
    /// writes entries.
    pub batch_size: usize,

    /// Whether to fsync the journal after every commit.
    pub sync_on_commit: bool,

    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::in_memory(),
            batch_size: DEFAULT_BATCH_SIZE,
            sync_on_commit: true,
            create_if_missing: true,
        }
    }
}

impl StoreConfig {
    /// In-memory store with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// On-disk store rooted at `path`.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self::default().location(StoreLocation::Directory(path.into()))
    }

    /// Sets the journal location.
    #[must_use]
    pub fn location(mut self, location: StoreLocation) -> Self {
        self.location = location;
        self
    }

    /// Sets the batch size. Zero is treated as one.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = if size == 0 { 1 } else { size };
        self
    }

    /// Sets whether to fsync after every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets whether to create the store directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }
}
