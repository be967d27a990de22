//! Cache status and operation outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Lifecycle status of an adapter's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStatus {
    /// No usable dataset is stored.
    NotDownloaded,
    /// A first download (or re-download) is in flight.
    Downloading,
    /// A usable dataset is stored; reads are served.
    Ready,
    /// A refresh of a ready cache is in flight.
    Updating,
    /// The last initialization or download failed.
    Error,
}

impl CacheStatus {
    /// Returns true while a download or refresh is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, CacheStatus::Downloading | CacheStatus::Updating)
    }

    /// Stable lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::NotDownloaded => "not-downloaded",
            CacheStatus::Downloading => "downloading",
            CacheStatus::Ready => "ready",
            CacheStatus::Updating => "updating",
            CacheStatus::Error => "error",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing the origin's version with the cached one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    /// Whether the origin has a newer dataset.
    pub has_update: bool,
    /// Version advertised by the origin, 0 when unknown.
    pub server_version: u64,
}

impl UpdateCheck {
    /// The answer given when the origin cannot be asked.
    pub const fn unknown() -> Self {
        Self {
            has_update: false,
            server_version: 0,
        }
    }
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RefreshOutcome {
    /// The cache was already at the origin's version; nothing was fetched.
    UpToDate {
        /// Cached version.
        version: u64,
    },
    /// A newer dataset was downloaded.
    Updated {
        /// Version before the refresh, 0 when nothing was cached.
        from: u64,
        /// Version now cached.
        to: u64,
    },
}

/// Counters kept by an adapter over its lifetime.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStats {
    /// Downloads that reached `Ready`.
    pub downloads_completed: u64,
    /// Downloads that ended in `Error`.
    pub downloads_failed: u64,
    /// Body bytes fetched by completed downloads.
    pub bytes_fetched: u64,
    /// Records written by completed downloads.
    pub records_written: u64,
    /// When the last download completed.
    pub last_download: Option<DateTime<Utc>>,
    /// Message of the last failure.
    pub last_error: Option<String>,
}
