//! Adapter for environments without a durable store.

use crate::adapter::SyncAdapter;
use crate::error::{SyncError, SyncResult};
use crate::progress::ProgressSink;
use crate::status::{CacheStatus, UpdateCheck};
use async_trait::async_trait;
use lexicache_store::{CacheMeta, Category, Conversation, Entry};

/// An adapter that never caches anything.
///
/// Used for server-side rendering and build steps: it keeps callers on the
/// same code path while every read comes back empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAdapter;

impl NoopAdapter {
    /// Creates the adapter.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SyncAdapter for NoopAdapter {
    async fn init(&self) -> SyncResult<()> {
        Ok(())
    }

    fn status(&self) -> CacheStatus {
        CacheStatus::NotDownloaded
    }

    async fn meta(&self) -> Option<CacheMeta> {
        None
    }

    async fn download(&self, _progress: &mut dyn ProgressSink) -> SyncResult<()> {
        Err(SyncError::Unavailable)
    }

    async fn get_entry(&self, _id: &str) -> Option<Entry> {
        None
    }

    async fn get_entries_by_category(&self, _category_id: &str) -> Vec<Entry> {
        Vec::new()
    }

    async fn get_categories(&self) -> Vec<Category> {
        Vec::new()
    }

    async fn get_conversations_by_category(&self, _category_id: &str) -> Vec<Conversation> {
        Vec::new()
    }

    async fn clear(&self) -> SyncResult<()> {
        Ok(())
    }

    async fn check_for_update(&self) -> UpdateCheck {
        UpdateCheck::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{DownloadProgress, NoProgress};

    #[tokio::test]
    async fn everything_is_inert() {
        let adapter = NoopAdapter::new();
        adapter.init().await.unwrap();
        assert_eq!(adapter.status(), CacheStatus::NotDownloaded);
        assert!(adapter.meta().await.is_none());
        assert!(adapter.get_entry("hello").await.is_none());
        assert!(adapter.get_categories().await.is_empty());
        assert!(adapter.get_entries_by_category("greetings").await.is_empty());
        assert!(adapter.get_conversations_by_category("greetings").await.is_empty());
        assert_eq!(adapter.check_for_update().await, UpdateCheck::unknown());
        adapter.clear().await.unwrap();
        assert_eq!(adapter.status(), CacheStatus::NotDownloaded);
    }

    #[tokio::test]
    async fn download_fails_without_progress() {
        let adapter = NoopAdapter::new();
        let mut events = 0;
        let err = adapter
            .download(&mut |_: DownloadProgress| events += 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Unavailable));
        assert_eq!(events, 0);
        assert!(adapter.download(&mut NoProgress).await.is_err());
    }
}
