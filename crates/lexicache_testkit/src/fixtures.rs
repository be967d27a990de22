//! Test fixtures and store helpers.
//!
//! Provides record builders, a small realistic dataset and stores backed
//! by a temporary directory.

use lexicache_store::{
    Category, Conversation, DatasetSnapshot, Entry, LocalStore, SnapshotTables, StoreConfig,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An entry in `category` with English and Korean translations.
pub fn entry(id: &str, category: &str) -> Entry {
    let translations = json!({
        "en": {
            "word": format!("{id} (en)"),
            "explanation": format!("meaning of {id}"),
            "examples": [{ "ko": format!("{id} 예문"), "en": format!("{id} example") }],
        },
        "ko": {
            "word": format!("{id} (ko)"),
            "explanation": format!("{id} 설명"),
        },
    });
    Entry {
        id: id.to_string(),
        korean: format!("{id}-ko"),
        romanization: Some(id.to_string()),
        part_of_speech: Some("noun".to_string()),
        category_id: category.to_string(),
        difficulty: Some("beginner".to_string()),
        frequency: Some("common".to_string()),
        tags: Some(json!(["test", category]).to_string()),
        translations: Some(translations.to_string()),
    }
}

/// A category listed at `sort_order`.
pub fn category(id: &str, sort_order: i64) -> Category {
    Category {
        id: id.to_string(),
        name_ko: format!("{id}-ko"),
        name_en: format!("{id}-en"),
        description_ko: None,
        description_en: Some(format!("All about {id}")),
        icon: None,
        color: None,
        sort_order,
    }
}

/// A two-turn conversation, optionally in `category`.
pub fn conversation(id: &str, category: Option<&str>) -> Conversation {
    let dialogue = json!([
        { "speaker": "A", "text": "안녕하세요!" },
        { "speaker": "B", "text": "네, 안녕하세요." },
    ]);
    Conversation {
        id: id.to_string(),
        category_id: category.map(str::to_string),
        title_ko: format!("{id} 제목"),
        title_en: format!("{id} title"),
        dialogue: dialogue.to_string(),
    }
}

/// Builds [`DatasetSnapshot`]s.
///
/// # Example
///
/// ```rust
/// use lexicache_testkit::SnapshotBuilder;
///
/// let snapshot = SnapshotBuilder::new(10)
///     .category("greetings", 1)
///     .entries("greetings", 3)
///     .build();
/// assert_eq!(snapshot.meta.entries_count, 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    version: u64,
    tables: SnapshotTables,
}

impl SnapshotBuilder {
    /// An empty snapshot at `version`.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            tables: SnapshotTables::default(),
        }
    }

    /// Adds a prebuilt entry.
    pub fn entry(mut self, entry: Entry) -> Self {
        self.tables.entries.push(entry);
        self
    }

    /// Adds `count` entries to `category`, with ids `<category>-<n>`.
    pub fn entries(mut self, category: &str, count: usize) -> Self {
        let start = self.tables.entries.len();
        self.tables.entries.extend(
            (start..start + count).map(|n| entry(&format!("{category}-{n:05}"), category)),
        );
        self
    }

    /// Adds a category.
    pub fn category(mut self, id: &str, sort_order: i64) -> Self {
        self.tables.categories.push(category(id, sort_order));
        self
    }

    /// Adds a conversation.
    pub fn conversation(mut self, id: &str, category: Option<&str>) -> Self {
        self.tables.conversations.push(conversation(id, category));
        self
    }

    /// Builds the snapshot with counts matching its tables.
    pub fn build(self) -> DatasetSnapshot {
        DatasetSnapshot::new(self.version, self.tables)
    }
}

/// A small dataset with two categories, five entries and two conversations.
///
/// Contains an entry with id `"annyeong"` but none with id `"hello"`.
pub fn sample_snapshot(version: u64) -> DatasetSnapshot {
    SnapshotBuilder::new(version)
        .category("food", 2)
        .category("greetings", 1)
        .entry(entry("annyeong", "greetings"))
        .entries("greetings", 2)
        .entries("food", 2)
        .conversation("greeting-01", Some("greetings"))
        .conversation("smalltalk-01", None)
        .build()
}

/// The origin's JSON document for [`sample_snapshot`].
pub fn sample_snapshot_json(version: u64) -> Vec<u8> {
    sample_snapshot(version)
        .to_json()
        .expect("snapshot encodes")
}

/// A directory-backed store that removes its directory on drop.
pub struct TempStore {
    /// The store. Not opened yet.
    pub store: LocalStore,
    dir: TempDir,
}

impl TempStore {
    /// A store in a fresh temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = LocalStore::new(Self::config_in(dir.path()));
        Self { store, dir }
    }

    /// Config for the store directory inside `root`.
    pub fn config_in(root: &Path) -> StoreConfig {
        StoreConfig::at_path(root.join("store"))
    }

    /// Config pointing at this store's directory.
    pub fn config(&self) -> StoreConfig {
        Self::config_in(self.dir.path())
    }

    /// The store directory.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    /// Another, unopened store over the same directory.
    pub fn reopen(&self) -> LocalStore {
        LocalStore::new(self.config())
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TempStore {
    type Target = LocalStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
