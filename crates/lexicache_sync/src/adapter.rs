//! The adapter contract shared by the real and the no-op implementation.

use crate::error::SyncResult;
use crate::progress::ProgressSink;
use crate::status::{CacheStatus, UpdateCheck};
use async_trait::async_trait;
use lexicache_store::{CacheMeta, Category, Conversation, Entry};

/// Offline access to the reference dataset.
///
/// Callers hold one adapter, usually as `Arc<dyn SyncAdapter>`, and never
/// need to know whether a durable store sits behind it.
///
/// Reads never fail: an adapter that is not [`Ready`](CacheStatus::Ready)
/// answers with `None` or an empty list.
#[async_trait]
pub trait SyncAdapter: Send + Sync {
    /// Opens the local store and derives the status from stored metadata.
    ///
    /// Idempotent; concurrent callers share one initialization. A failed
    /// initialization sets [`CacheStatus::Error`] and may be retried.
    async fn init(&self) -> SyncResult<()>;

    /// Current status. Never performs I/O.
    fn status(&self) -> CacheStatus;

    /// Metadata of the cached dataset.
    async fn meta(&self) -> Option<CacheMeta>;

    /// Replaces the cached dataset with the origin's current snapshot.
    ///
    /// On failure the status is already [`CacheStatus::Error`] when the
    /// error is returned.
    async fn download(&self, progress: &mut dyn ProgressSink) -> SyncResult<()>;

    /// One entry by id.
    async fn get_entry(&self, id: &str) -> Option<Entry>;

    /// Entries of a category, ordered by id.
    async fn get_entries_by_category(&self, category_id: &str) -> Vec<Entry>;

    /// All categories ordered by `sort_order`.
    async fn get_categories(&self) -> Vec<Category>;

    /// Conversations of a category, ordered by id.
    async fn get_conversations_by_category(&self, category_id: &str) -> Vec<Conversation>;

    /// Drops the cached dataset and its metadata.
    async fn clear(&self) -> SyncResult<()>;

    /// Asks the origin whether a newer dataset exists. Never fails.
    async fn check_for_update(&self) -> UpdateCheck;
}
