//! Record types held by the local store.
//!
//! Field names follow the wire format served by the origin, so a record
//! decoded from a dataset snapshot is stored as-is.

use crate::table::TableAccess;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three record collections of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Dictionary entries.
    Entries,
    /// Entry categories.
    Categories,
    /// Example dialogues.
    Conversations,
}

impl Collection {
    /// All collections, in the order a generation is written.
    pub const ALL: [Collection; 3] = [
        Collection::Entries,
        Collection::Categories,
        Collection::Conversations,
    ];

    /// Stable tag used in journal frames.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Entries => 1,
            Self::Categories => 2,
            Self::Conversations => 3,
        }
    }

    /// Inverse of [`as_byte`](Self::as_byte).
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Entries),
            2 => Some(Self::Categories),
            3 => Some(Self::Conversations),
            _ => None,
        }
    }

    /// Collection name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Entries => "entries",
            Self::Categories => "categories",
            Self::Conversations => "conversations",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Secondary index fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexField {
    /// `category_id`, indexed on entries and conversations.
    CategoryId,
}

impl fmt::Display for IndexField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CategoryId => f.write_str("category_id"),
        }
    }
}

/// Fields a collection can be listed in order of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    /// `sort_order`, on categories.
    SortOrder,
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SortOrder => f.write_str("sort_order"),
        }
    }
}

/// A record that lives in one of the store's collections.
///
/// This trait is sealed; it is implemented for [`Entry`], [`Category`] and
/// [`Conversation`].
pub trait Record:
    TableAccess + Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The collection holding this record type.
    const COLLECTION: Collection;

    /// Secondary indexes maintained for this record type.
    const INDEXES: &'static [IndexField] = &[];

    /// Orderings supported by [`LocalStore::get_all_ordered`](crate::LocalStore::get_all_ordered).
    const ORDERS: &'static [OrderField] = &[];

    /// Natural key.
    fn key(&self) -> &str;

    /// Value of an indexed field, `None` when the record has no value for it.
    fn index_value(&self, _field: IndexField) -> Option<&str> {
        None
    }

    /// Value of an ordering field.
    fn order_value(&self, _field: OrderField) -> Option<i64> {
        None
    }
}

/// A dictionary entry.
///
/// `tags` and `translations` hold JSON text exactly as served; see the
/// `locale` helpers for decoding them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique id, e.g. `"annyeong"`.
    pub id: String,
    /// Korean headword.
    pub korean: String,
    /// Romanized reading.
    #[serde(default)]
    pub romanization: Option<String>,
    /// Part of speech.
    #[serde(default)]
    pub part_of_speech: Option<String>,
    /// Owning category. Not checked against the categories collection.
    pub category_id: String,
    /// Difficulty classifier.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Frequency classifier.
    #[serde(default)]
    pub frequency: Option<String>,
    /// JSON-encoded list of tags.
    #[serde(default)]
    pub tags: Option<String>,
    /// JSON-encoded per-locale translation bundle.
    #[serde(default)]
    pub translations: Option<String>,
}

impl Record for Entry {
    const COLLECTION: Collection = Collection::Entries;
    const INDEXES: &'static [IndexField] = &[IndexField::CategoryId];

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: IndexField) -> Option<&str> {
        match field {
            IndexField::CategoryId => Some(&self.category_id),
        }
    }
}

/// An entry category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique id, e.g. `"greetings"`.
    pub id: String,
    /// Korean display name.
    pub name_ko: String,
    /// English display name.
    pub name_en: String,
    /// Korean description.
    #[serde(default)]
    pub description_ko: Option<String>,
    /// English description.
    #[serde(default)]
    pub description_en: Option<String>,
    /// Icon token.
    #[serde(default)]
    pub icon: Option<String>,
    /// Color token.
    #[serde(default)]
    pub color: Option<String>,
    /// Position in category listings.
    pub sort_order: i64,
}

impl Record for Category {
    const COLLECTION: Collection = Collection::Categories;
    const ORDERS: &'static [OrderField] = &[OrderField::SortOrder];

    fn key(&self) -> &str {
        &self.id
    }

    fn order_value(&self, field: OrderField) -> Option<i64> {
        match field {
            OrderField::SortOrder => Some(self.sort_order),
        }
    }
}

/// An example dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique id.
    pub id: String,
    /// Owning category, if any.
    #[serde(default)]
    pub category_id: Option<String>,
    /// Korean title.
    pub title_ko: String,
    /// English title.
    pub title_en: String,
    /// JSON-encoded ordered list of `{speaker, text}` turns.
    pub dialogue: String,
}

impl Record for Conversation {
    const COLLECTION: Collection = Collection::Conversations;
    const INDEXES: &'static [IndexField] = &[IndexField::CategoryId];

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: IndexField) -> Option<&str> {
        match field {
            IndexField::CategoryId => self.category_id.as_deref(),
        }
    }
}

/// Metadata describing the generation currently held by the store.
///
/// There is at most one of these (the `"main"` slot). It is written last by
/// a download, so its presence with a positive entry count is what makes the
/// cache usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMeta {
    /// Version of the applied snapshot.
    pub version: u64,
    /// When the snapshot was applied.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub downloaded_at: DateTime<Utc>,
    /// Entry count reported by the snapshot.
    pub entries_count: u64,
    /// Category count reported by the snapshot.
    pub categories_count: u64,
    /// Conversation count reported by the snapshot.
    pub conversations_count: u64,
}

impl CacheMeta {
    /// Whether this metadata describes a usable cache.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.entries_count > 0
    }
}
