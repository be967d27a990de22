//! The local store facade.

use crate::config::{StoreConfig, StoreLocation};
use crate::dir::StoreDir;
use crate::error::{StoreError, StoreResult};
use crate::journal::{Frame, Journal, JournalRecord, JournalStats, RecordBatch};
use crate::record::{CacheMeta, Collection, IndexField, OrderField, Record};
use crate::table::{Table, Tables};
use lexicache_storage::{FileBackend, StorageBackend};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// The on-device table set: entries, categories, conversations and the
/// metadata slot.
///
/// A `LocalStore` is created closed. [`open`](Self::open) replays the
/// journal and must succeed before any other operation; until then every
/// operation fails with [`StoreError::NotOpen`].
///
/// Reads are served from memory. Writes append to the journal and, with
/// [`StoreConfig::sync_on_commit`], wait for the disk; async callers run
/// them through [`blocking`](Self::blocking). Clones share the opened state.
///
/// # Example
///
/// ```rust
/// use lexicache_store::{Entry, LocalStore};
///
/// # async fn demo() -> lexicache_store::StoreResult<()> {
/// let store = LocalStore::in_memory();
/// store.open().await?;
/// assert_eq!(store.get::<Entry>("hello")?, None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalStore {
    config: StoreConfig,
    inner: Arc<OnceCell<Opened>>,
}

struct Opened {
    // Holds the directory lock for as long as the store lives.
    _dir: Option<StoreDir>,
    journal: Journal,
    tables: RwLock<Tables>,
}

impl LocalStore {
    /// Creates a closed store with the given configuration.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            inner: Arc::new(OnceCell::new()),
        }
    }

    /// Creates a closed store backed by a fresh in-memory journal.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(StoreConfig::default())
    }

    /// The store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether [`open`](Self::open) has completed successfully.
    pub fn is_open(&self) -> bool {
        self.inner.initialized()
    }

    /// Opens the store, creating it on first use.
    ///
    /// Idempotent. Concurrent callers wait on a single open; a failed open
    /// leaves the store closed and the next call tries again. Locking the
    /// directory and replaying the journal run on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Lock contention, I/O failures and journal corruption.
    pub async fn open(&self) -> StoreResult<()> {
        self.inner
            .get_or_try_init(|| async {
                let config = self.config.clone();
                tokio::task::spawn_blocking(move || open_inner(&config)).await?
            })
            .await?;
        Ok(())
    }

    /// Runs `f` against this store on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, or [`StoreError::Task`] if it panicked.
    pub async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&LocalStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store)).await?
    }

    fn opened(&self) -> StoreResult<&Opened> {
        self.inner.get().ok_or(StoreError::NotOpen)
    }

    /// Looks a record up by its natural key.
    pub fn get<R: Record>(&self, key: &str) -> StoreResult<Option<R>> {
        let tables = self.opened()?.tables.read();
        Ok(R::table(&tables).get(key).cloned())
    }

    /// Records whose indexed `field` equals `value`, in natural key order.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnsupportedIndex`] when `R` has no index on `field`.
    pub fn get_by_index<R: Record>(&self, field: IndexField, value: &str) -> StoreResult<Vec<R>> {
        if !R::INDEXES.contains(&field) {
            return Err(StoreError::UnsupportedIndex {
                collection: R::COLLECTION,
                field,
            });
        }
        let tables = self.opened()?.tables.read();
        Ok(R::table(&tables)
            .lookup(field, value)
            .into_iter()
            .cloned()
            .collect())
    }

    /// All records of `R` ordered by `field`, ties in natural key order.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnsupportedOrder`] when `R` cannot be ordered by `field`.
    pub fn get_all_ordered<R: Record>(&self, field: OrderField) -> StoreResult<Vec<R>> {
        if !R::ORDERS.contains(&field) {
            return Err(StoreError::UnsupportedOrder {
                collection: R::COLLECTION,
                field,
            });
        }
        let tables = self.opened()?.tables.read();
        Ok(R::table(&tables).ordered(field).into_iter().cloned().collect())
    }

    /// Number of records in `collection`.
    pub fn count(&self, collection: Collection) -> StoreResult<usize> {
        Ok(self.opened()?.tables.read().len(collection))
    }

    /// Inserts `records` as one journal transaction.
    ///
    /// Either every record is inserted or none is.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] if a key already exists or repeats within
    /// the batch; journal write failures.
    pub fn insert_batch<R: Record>(&self, records: &[R]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let opened = self.opened()?;
        let mut tables = opened.tables.write();

        check_unique(R::table(&tables), records)?;
        opened.journal.append(&Frame::insert(records)?)?;

        let table = R::table_mut(&mut tables);
        for record in records {
            table.insert(record.clone());
        }
        debug!(collection = %R::COLLECTION, records = records.len(), "batch committed");
        Ok(())
    }

    /// Empties `R`'s collection and inserts `records` in batches of
    /// [`StoreConfig::batch_size`].
    ///
    /// Batches already committed stay committed if a later one fails.
    pub fn replace_all<R: Record>(&self, records: &[R]) -> StoreResult<()> {
        self.clear_collection(R::COLLECTION)?;
        for chunk in records.chunks(self.config.batch_size.max(1)) {
            self.insert_batch(chunk)?;
        }
        Ok(())
    }

    fn clear_collection(&self, collection: Collection) -> StoreResult<()> {
        let opened = self.opened()?;
        let mut tables = opened.tables.write();
        opened.journal.append(&Frame::clear(collection))?;
        tables.clear(collection);
        Ok(())
    }

    /// Empties the three record collections. Metadata is kept.
    pub fn clear_collections(&self) -> StoreResult<()> {
        let opened = self.opened()?;
        let mut tables = opened.tables.write();

        let survivors = match &tables.meta {
            Some(meta) => vec![Frame::put_meta(meta)?],
            None => Vec::new(),
        };
        opened.journal.checkpoint(&survivors)?;
        for collection in Collection::ALL {
            tables.clear(collection);
        }
        info!("record collections cleared");
        Ok(())
    }

    /// The metadata slot.
    pub fn get_metadata(&self) -> StoreResult<Option<CacheMeta>> {
        Ok(self.opened()?.tables.read().meta.clone())
    }

    /// Overwrites the metadata slot.
    pub fn put_metadata(&self, meta: &CacheMeta) -> StoreResult<()> {
        let opened = self.opened()?;
        let mut tables = opened.tables.write();
        opened.journal.append(&Frame::put_meta(meta)?)?;
        tables.meta = Some(meta.clone());
        debug!(version = meta.version, "metadata written");
        Ok(())
    }

    /// Empties every collection and the metadata slot.
    pub fn clear_all(&self) -> StoreResult<()> {
        let opened = self.opened()?;
        let mut tables = opened.tables.write();
        opened.journal.checkpoint(&[])?;
        *tables = Tables::default();
        info!("local store cleared");
        Ok(())
    }

    /// Frame and byte statistics of the journal.
    pub fn journal_stats(&self) -> StoreResult<JournalStats> {
        self.opened()?.journal.stats()
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish()
    }
}

fn open_inner(config: &StoreConfig) -> StoreResult<Opened> {
    let (dir, backend): (Option<StoreDir>, Box<dyn StorageBackend>) = match &config.location {
        StoreLocation::InMemory(volume) => (None, Box::new(volume.clone())),
        StoreLocation::Directory(path) => {
            let dir = StoreDir::open(path, config.create_if_missing)?;
            let backend = FileBackend::open(&dir.journal_path())?;
            (Some(dir), Box::new(backend))
        }
    };

    let journal = Journal::new(backend, config.sync_on_commit);
    let mut tables = Tables::default();
    let frames = journal.replay(|record| apply(&mut tables, record))?;

    info!(
        location = %describe(&config.location),
        frames,
        bytes = journal.size()?,
        entries = tables.entries.len(),
        categories = tables.categories.len(),
        conversations = tables.conversations.len(),
        version = tables.meta.as_ref().map(|m| m.version),
        "local store opened"
    );

    Ok(Opened {
        _dir: dir,
        journal,
        tables: RwLock::new(tables),
    })
}

fn check_unique<R: Record>(table: &Table<R>, records: &[R]) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        let key = record.key();
        if table.contains(key) || !seen.insert(key) {
            return Err(StoreError::DuplicateKey {
                collection: R::COLLECTION,
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

fn apply(tables: &mut Tables, record: JournalRecord) {
    match record {
        JournalRecord::Insert(batch) => match batch {
            RecordBatch::Entries(rows) => rows.into_iter().for_each(|r| tables.entries.insert(r)),
            RecordBatch::Categories(rows) => rows.into_iter().for_each(|r| tables.categories.insert(r)),
            RecordBatch::Conversations(rows) => {
                rows.into_iter().for_each(|r| tables.conversations.insert(r));
            }
        },
        JournalRecord::Clear(collection) => tables.clear(collection),
        JournalRecord::PutMeta(meta) => tables.meta = Some(meta),
    }
}

fn describe(location: &StoreLocation) -> String {
    match location {
        StoreLocation::InMemory(_) => "memory".to_string(),
        StoreLocation::Directory(path) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Category, Conversation, Entry};
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, category: &str) -> Entry {
        Entry {
            id: id.into(),
            korean: id.into(),
            romanization: None,
            part_of_speech: None,
            category_id: category.into(),
            difficulty: None,
            frequency: None,
            tags: None,
            translations: None,
        }
    }

    fn meta(version: u64, entries: u64) -> CacheMeta {
        CacheMeta {
            version,
            downloaded_at: Utc.timestamp_millis_opt(0).unwrap(),
            entries_count: entries,
            categories_count: 0,
            conversations_count: 0,
        }
    }

    async fn open_store() -> LocalStore {
        let store = LocalStore::in_memory();
        store.open().await.unwrap();
        store
    }

    #[tokio::test]
    async fn operations_before_open_fail() {
        let store = LocalStore::in_memory();
        assert!(!store.is_open());
        assert!(matches!(store.get::<Entry>("a"), Err(StoreError::NotOpen)));
        assert!(matches!(store.get_metadata(), Err(StoreError::NotOpen)));
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let store = open_store().await;
        store.insert_batch(&[entry("a", "c")]).unwrap();
        store.open().await.unwrap();
        assert_eq!(store.count(Collection::Entries).unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_key_rejects_whole_batch() {
        let store = open_store().await;
        store.insert_batch(&[entry("a", "c")]).unwrap();

        let err = store.insert_batch(&[entry("b", "c"), entry("a", "c")]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { collection: Collection::Entries, ref key } if key == "a"));
        assert_eq!(store.get::<Entry>("b").unwrap(), None);

        let err = store.insert_batch(&[entry("x", "c"), entry("x", "c")]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn unsupported_index_and_order_are_rejected() {
        let store = open_store().await;
        assert!(matches!(
            store.get_by_index::<Category>(IndexField::CategoryId, "x"),
            Err(StoreError::UnsupportedIndex { .. })
        ));
        assert!(matches!(
            store.get_all_ordered::<Entry>(OrderField::SortOrder),
            Err(StoreError::UnsupportedOrder { .. })
        ));
    }

    #[tokio::test]
    async fn replace_all_drops_previous_rows() {
        let store = open_store().await;
        store.replace_all(&[entry("a", "c"), entry("b", "c")]).unwrap();
        store.replace_all(&[entry("b", "c"), entry("z", "c")]).unwrap();

        assert_eq!(store.get::<Entry>("a").unwrap(), None);
        assert!(store.get::<Entry>("z").unwrap().is_some());
        assert_eq!(store.count(Collection::Entries).unwrap(), 2);
    }

    #[tokio::test]
    async fn clear_collections_keeps_metadata() {
        let store = open_store().await;
        store.insert_batch(&[entry("a", "c")]).unwrap();
        store
            .insert_batch(&[Conversation {
                id: "conv".into(),
                category_id: None,
                title_ko: String::new(),
                title_en: String::new(),
                dialogue: "[]".into(),
            }])
            .unwrap();
        store.put_metadata(&meta(3, 1)).unwrap();

        store.clear_collections().unwrap();
        for collection in Collection::ALL {
            assert_eq!(store.count(collection).unwrap(), 0);
        }
        assert_eq!(store.get_metadata().unwrap(), Some(meta(3, 1)));
    }

    #[tokio::test]
    async fn blocking_runs_off_the_runtime_thread() {
        let store = open_store().await;
        let caller = std::thread::current().id();

        let worker = store
            .blocking(|store| {
                store.insert_batch(&[entry("a", "c")])?;
                Ok(std::thread::current().id())
            })
            .await
            .unwrap();
        assert_ne!(worker, caller);
        assert_eq!(store.count(Collection::Entries).unwrap(), 1);
    }

    #[tokio::test]
    async fn clones_share_the_opened_state() {
        let store = LocalStore::in_memory();
        let clone = store.clone();
        clone.open().await.unwrap();
        assert!(store.is_open());

        let err = store
            .blocking(|store| store.insert_batch(&[entry("a", "c"), entry("a", "c")]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn clear_all_drops_metadata_and_shrinks_journal() {
        let store = open_store().await;
        store.insert_batch(&[entry("a", "c")]).unwrap();
        store.put_metadata(&meta(3, 1)).unwrap();

        store.clear_all().unwrap();
        assert_eq!(store.get_metadata().unwrap(), None);
        assert_eq!(store.journal_stats().unwrap().valid_bytes, 0);
    }
}
