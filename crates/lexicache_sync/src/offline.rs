//! The adapter backed by a durable local store.

use crate::adapter::SyncAdapter;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::progress::{ProgressSink, ProgressTracker};
use crate::status::{CacheStatus, RefreshOutcome, SyncStats, UpdateCheck};
use crate::transport::OriginTransport;
use async_trait::async_trait;
use chrono::Utc;
use lexicache_store::{
    CacheMeta, Category, Conversation, DatasetSnapshot, Entry, IndexField, LocalStore, OrderField,
    SnapshotTables, StoreResult,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// Syncs the dataset from the origin into a [`LocalStore`] and serves reads
/// from it.
///
/// # Status machine
///
/// ```text
/// init:      (new) ──► Ready | NotDownloaded | Error
/// download:  NotDownloaded | Ready | Error ──► Downloading ──► Ready | Error
/// refresh:   Ready ──► Updating ──► Ready | Error
/// clear:     any ──► NotDownloaded
/// ```
///
/// `download` is not reentrant: callers must not start a second download
/// while one is in flight.
pub struct OfflineAdapter {
    config: SyncConfig,
    store: LocalStore,
    transport: Arc<dyn OriginTransport>,
    initialized: OnceCell<()>,
    status: RwLock<CacheStatus>,
    stats: RwLock<SyncStats>,
}

struct Applied {
    meta: CacheMeta,
    bytes: u64,
    records: u64,
}

impl OfflineAdapter {
    /// Creates an adapter. Nothing is opened until [`init`](SyncAdapter::init).
    pub fn new(config: SyncConfig, transport: Arc<dyn OriginTransport>) -> Self {
        let store = LocalStore::new(config.store.clone());
        Self {
            config,
            store,
            transport,
            initialized: OnceCell::new(),
            status: RwLock::new(CacheStatus::NotDownloaded),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// The adapter's configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Lifetime counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    fn set_status(&self, status: CacheStatus) {
        let previous = std::mem::replace(&mut *self.status.write(), status);
        if previous != status {
            debug!(from = %previous, to = %status, "cache status changed");
        }
    }

    fn record_failure(&self, err: &SyncError) {
        self.set_status(CacheStatus::Error);
        let mut stats = self.stats.write();
        stats.downloads_failed += 1;
        stats.last_error = Some(err.to_string());
    }

    async fn initialize(&self) -> SyncResult<()> {
        self.store.open().await?;

        let meta = self.store.get_metadata()?;
        let status = match &meta {
            Some(meta) if meta.is_usable() => CacheStatus::Ready,
            _ => CacheStatus::NotDownloaded,
        };
        self.set_status(status);
        info!(
            status = %status,
            version = meta.as_ref().map(|m| m.version),
            "offline cache initialized"
        );
        Ok(())
    }

    /// Runs `init` and reports whether reads may be served.
    async fn readable(&self) -> bool {
        if let Err(err) = self.init().await {
            debug!(error = %err, "serving empty read after failed init");
            return false;
        }
        self.status() == CacheStatus::Ready
    }

    fn read_or_default<T: Default>(&self, what: &str, result: StoreResult<T>) -> T {
        result.unwrap_or_else(|err| {
            warn!(error = %err, what, "local store read failed");
            T::default()
        })
    }

    /// Checks for a newer dataset and downloads it only if there is one.
    ///
    /// A ready cache moves through [`CacheStatus::Updating`]; any other
    /// cache through [`CacheStatus::Downloading`].
    ///
    /// # Errors
    ///
    /// Same as [`download`](SyncAdapter::download). A failed update check
    /// is not an error: it is reported as [`RefreshOutcome::UpToDate`].
    pub async fn refresh(&self, progress: &mut dyn ProgressSink) -> SyncResult<RefreshOutcome> {
        let check = self.check_for_update().await;
        let from = self.local_version();
        if !check.has_update {
            debug!(version = from, "cache is up to date");
            return Ok(RefreshOutcome::UpToDate { version: from });
        }

        let in_flight = if self.status() == CacheStatus::Ready {
            CacheStatus::Updating
        } else {
            CacheStatus::Downloading
        };
        let meta = self.run_download(in_flight, progress).await?;
        Ok(RefreshOutcome::Updated {
            from,
            to: meta.version,
        })
    }

    fn local_version(&self) -> u64 {
        self.store
            .get_metadata()
            .ok()
            .flatten()
            .map_or(0, |m| m.version)
    }

    #[instrument(skip_all, fields(endpoint = %self.config.endpoint, status = %in_flight))]
    async fn run_download(
        &self,
        in_flight: CacheStatus,
        progress: &mut dyn ProgressSink,
    ) -> SyncResult<CacheMeta> {
        self.init().await?;

        self.set_status(in_flight);
        let mut tracker = ProgressTracker::new(progress);
        tracker.started();

        match self.fetch_and_apply(&mut tracker).await {
            Ok(applied) => {
                tracker.complete();
                self.set_status(CacheStatus::Ready);
                {
                    let mut stats = self.stats.write();
                    stats.downloads_completed += 1;
                    stats.bytes_fetched += applied.bytes;
                    stats.records_written += applied.records;
                    stats.last_download = Some(applied.meta.downloaded_at);
                    stats.last_error = None;
                }
                info!(
                    version = applied.meta.version,
                    entries = applied.meta.entries_count,
                    bytes = applied.bytes,
                    "offline cache ready"
                );
                Ok(applied.meta)
            }
            Err(err) => {
                self.record_failure(&err);
                warn!(error = %err, "download failed");
                Err(err)
            }
        }
    }

    async fn fetch_and_apply(&self, tracker: &mut ProgressTracker<'_>) -> SyncResult<Applied> {
        let mut body = self.transport.fetch().await?;
        let total = body.content_length();
        let mut buf = Vec::with_capacity(total.map_or(0, |t| t.min(64 << 20) as usize));

        while let Some(chunk) = body.next_chunk().await? {
            buf.extend_from_slice(&chunk);
            if let Some(total) = total.filter(|&t| t > 0) {
                tracker.fetched(buf.len() as u64, total);
            }
        }
        let bytes = buf.len() as u64;
        debug!(bytes, "snapshot received");

        let mut snapshot = DatasetSnapshot::from_json(&buf)?;
        drop(buf);
        tracker.parsed();
        debug!(
            version = snapshot.version,
            entries = snapshot.tables.entries.len(),
            categories = snapshot.tables.categories.len(),
            conversations = snapshot.tables.conversations.len(),
            "snapshot decoded"
        );

        tracker.storing();
        self.store.blocking(|store| store.clear_collections()).await?;

        let SnapshotTables {
            entries,
            categories,
            conversations,
        } = std::mem::take(&mut snapshot.tables);
        let total_entries = entries.len() as u64;
        let records = total_entries + categories.len() as u64 + conversations.len() as u64;

        let batch_size = self.config.store.batch_size.max(1);
        let mut entries = entries.into_iter();
        let mut done = 0u64;
        loop {
            let batch: Vec<Entry> = entries.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            done += batch.len() as u64;
            self.store.blocking(move |store| store.insert_batch(&batch)).await?;
            tracker.stored(done, total_entries);
        }

        let meta = snapshot.cache_meta(Utc::now());
        let written = meta.clone();
        self.store
            .blocking(move |store| {
                store.insert_batch(&categories)?;
                store.insert_batch(&conversations)?;
                store.put_metadata(&written)
            })
            .await?;

        Ok(Applied {
            meta,
            bytes,
            records,
        })
    }
}

#[async_trait]
impl SyncAdapter for OfflineAdapter {
    async fn init(&self) -> SyncResult<()> {
        self.initialized
            .get_or_try_init(|| async {
                self.initialize().await.inspect_err(|err| {
                    warn!(error = %err, "offline cache initialization failed");
                    self.set_status(CacheStatus::Error);
                    self.stats.write().last_error = Some(err.to_string());
                })
            })
            .await?;
        Ok(())
    }

    fn status(&self) -> CacheStatus {
        *self.status.read()
    }

    async fn meta(&self) -> Option<CacheMeta> {
        if let Err(err) = self.init().await {
            debug!(error = %err, "no metadata after failed init");
            return None;
        }
        self.read_or_default("metadata", self.store.get_metadata())
    }

    async fn download(&self, progress: &mut dyn ProgressSink) -> SyncResult<()> {
        self.run_download(CacheStatus::Downloading, progress).await?;
        Ok(())
    }

    async fn get_entry(&self, id: &str) -> Option<Entry> {
        if !self.readable().await {
            return None;
        }
        self.read_or_default("entry", self.store.get::<Entry>(id))
    }

    async fn get_entries_by_category(&self, category_id: &str) -> Vec<Entry> {
        if !self.readable().await {
            return Vec::new();
        }
        self.read_or_default(
            "entries by category",
            self.store.get_by_index::<Entry>(IndexField::CategoryId, category_id),
        )
    }

    async fn get_categories(&self) -> Vec<Category> {
        if !self.readable().await {
            return Vec::new();
        }
        self.read_or_default(
            "categories",
            self.store.get_all_ordered::<Category>(OrderField::SortOrder),
        )
    }

    async fn get_conversations_by_category(&self, category_id: &str) -> Vec<Conversation> {
        if !self.readable().await {
            return Vec::new();
        }
        self.read_or_default(
            "conversations by category",
            self.store
                .get_by_index::<Conversation>(IndexField::CategoryId, category_id),
        )
    }

    async fn clear(&self) -> SyncResult<()> {
        self.init().await?;
        self.store.blocking(|store| store.clear_all()).await?;
        self.set_status(CacheStatus::NotDownloaded);
        info!("offline cache cleared");
        Ok(())
    }

    async fn check_for_update(&self) -> UpdateCheck {
        let header = match self.transport.probe(&self.config.version_header).await {
            Ok(header) => header,
            Err(err) => {
                warn!(error = %err, "update check failed");
                return UpdateCheck::unknown();
            }
        };
        let server_version = header
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);

        if let Err(err) = self.init().await {
            warn!(error = %err, "update check could not read local version");
            return UpdateCheck::unknown();
        }
        let local_version = self.local_version();

        let check = UpdateCheck {
            has_update: server_version > local_version,
            server_version,
        };
        debug!(server_version, local_version, has_update = check.has_update, "update check");
        check
    }
}

impl std::fmt::Debug for OfflineAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineAdapter")
            .field("endpoint", &self.config.endpoint)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::transport::MockOrigin;
    use lexicache_store::{Collection, StoreConfig};

    fn snapshot(version: u64, ids: &[&str]) -> DatasetSnapshot {
        let entries = ids
            .iter()
            .map(|id| Entry {
                id: id.to_string(),
                korean: format!("{id}-ko"),
                romanization: None,
                part_of_speech: None,
                category_id: "c".into(),
                difficulty: None,
                frequency: None,
                tags: None,
                translations: None,
            })
            .collect();
        DatasetSnapshot::new(
            version,
            SnapshotTables {
                entries,
                ..SnapshotTables::default()
            },
        )
    }

    #[tokio::test]
    async fn nothing_opens_before_init() {
        let adapter = OfflineAdapter::new(SyncConfig::default(), Arc::new(MockOrigin::new()));
        assert!(!adapter.store().is_open());
        assert_eq!(adapter.status(), CacheStatus::NotDownloaded);
        assert!(format!("{adapter:?}").contains("OfflineAdapter"));

        adapter.init().await.unwrap();
        assert!(adapter.store().is_open());
    }

    #[tokio::test]
    async fn download_writes_entries_in_batches() {
        let origin = Arc::new(MockOrigin::serving(&snapshot(3, &["a", "b", "c"])));
        let config = SyncConfig::default().with_store(StoreConfig::new().batch_size(2));
        let adapter = OfflineAdapter::new(config, origin);
        adapter.download(&mut NoProgress).await.unwrap();

        assert_eq!(adapter.store().count(Collection::Entries).unwrap(), 3);
        let stats = adapter.store().journal_stats().unwrap();
        assert_eq!(stats.frames_by_kind.get("insert"), Some(&2));
        assert_eq!(stats.frames_by_kind.get("put-meta"), Some(&1));
    }

    #[tokio::test]
    async fn duplicate_ids_fail_the_download() {
        let origin = Arc::new(MockOrigin::serving(&snapshot(3, &["a", "a"])));
        let adapter = OfflineAdapter::new(SyncConfig::default(), origin);

        let err = adapter.download(&mut NoProgress).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));
        assert_eq!(adapter.status(), CacheStatus::Error);
        assert!(adapter.meta().await.is_none());
    }
}
