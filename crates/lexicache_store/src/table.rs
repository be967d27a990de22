//! In-memory tables rebuilt from the journal.
//!
//! Each collection is a `BTreeMap` keyed by natural key plus one ordered
//! index per declared [`IndexField`]. Index buckets are `BTreeSet`s of keys,
//! so lookups come back in natural key order without an extra sort.

use crate::record::{CacheMeta, Category, Collection, Conversation, Entry, IndexField, OrderField, Record};
use std::collections::{BTreeMap, BTreeSet};

/// Gives a record type access to its table. Sealed: only this crate's record
/// types implement it.
pub trait TableAccess: Sized {
    /// Borrow the table holding `Self`.
    fn table(tables: &Tables) -> &Table<Self>;
    /// Mutably borrow the table holding `Self`.
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

/// One collection's rows and secondary indexes.
#[derive(Debug)]
pub struct Table<R> {
    rows: BTreeMap<String, R>,
    index: BTreeMap<(IndexField, String), BTreeSet<String>>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<R: Record> Table<R> {
    pub fn get(&self, key: &str) -> Option<&R> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Inserts or overwrites a row and keeps the indexes consistent.
    pub fn insert(&mut self, record: R) {
        let key = record.key().to_string();
        if let Some(previous) = self.rows.remove(&key) {
            self.unindex(&previous);
        }
        for &field in R::INDEXES {
            if let Some(value) = record.index_value(field) {
                self.index
                    .entry((field, value.to_string()))
                    .or_default()
                    .insert(key.clone());
            }
        }
        self.rows.insert(key, record);
    }

    fn unindex(&mut self, record: &R) {
        for &field in R::INDEXES {
            if let Some(value) = record.index_value(field) {
                let slot = (field, value.to_string());
                if let Some(keys) = self.index.get_mut(&slot) {
                    keys.remove(record.key());
                    if keys.is_empty() {
                        self.index.remove(&slot);
                    }
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }

    /// Rows whose `field` equals `value`, in key order.
    pub fn lookup(&self, field: IndexField, value: &str) -> Vec<&R> {
        self.index
            .get(&(field, value.to_string()))
            .map(|keys| keys.iter().filter_map(|k| self.rows.get(k)).collect())
            .unwrap_or_default()
    }

    /// All rows ordered by `field`, ties broken by key.
    pub fn ordered(&self, field: OrderField) -> Vec<&R> {
        // BTreeMap iteration is already key-ordered and sort_by_key is stable.
        let mut rows: Vec<&R> = self.rows.values().collect();
        rows.sort_by_key(|r| r.order_value(field));
        rows
    }
}

/// The full table set: one generation plus the metadata slot.
#[derive(Debug, Default)]
pub struct Tables {
    pub entries: Table<Entry>,
    pub categories: Table<Category>,
    pub conversations: Table<Conversation>,
    pub meta: Option<CacheMeta>,
}

impl Tables {
    pub fn clear(&mut self, collection: Collection) {
        match collection {
            Collection::Entries => self.entries.clear(),
            Collection::Categories => self.categories.clear(),
            Collection::Conversations => self.conversations.clear(),
        }
    }

    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Entries => self.entries.len(),
            Collection::Categories => self.categories.len(),
            Collection::Conversations => self.conversations.len(),
        }
    }
}

impl TableAccess for Entry {
    fn table(tables: &Tables) -> &Table<Self> {
        &tables.entries
    }
    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.entries
    }
}

impl TableAccess for Category {
    fn table(tables: &Tables) -> &Table<Self> {
        &tables.categories
    }
    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.categories
    }
}

impl TableAccess for Conversation {
    fn table(tables: &Tables) -> &Table<Self> {
        &tables.conversations
    }
    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.conversations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn category(id: &str, sort_order: i64) -> Category {
        Category {
            id: id.into(),
            name_ko: id.into(),
            name_en: id.into(),
            description_ko: None,
            description_en: None,
            icon: None,
            color: None,
            sort_order,
        }
    }

    #[test]
    fn lookup_returns_key_order() {
        let mut table = Table::default();
        table.insert(entry("c", "food"));
        table.insert(entry("a", "food"));
        table.insert(entry("b", "travel"));

        let ids: Vec<_> = table.lookup(IndexField::CategoryId, "food").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert!(table.lookup(IndexField::CategoryId, "missing").is_empty());
    }

    #[test]
    fn overwrite_moves_index_bucket() {
        let mut table = Table::default();
        table.insert(entry("a", "food"));
        table.insert(entry("a", "travel"));

        assert_eq!(table.len(), 1);
        assert!(table.lookup(IndexField::CategoryId, "food").is_empty());
        assert_eq!(table.lookup(IndexField::CategoryId, "travel").len(), 1);
    }

    #[test]
    fn ordered_breaks_ties_by_key() {
        let mut table = Table::default();
        table.insert(category("zeta", 1));
        table.insert(category("beta", 2));
        table.insert(category("alpha", 1));

        let ids: Vec<_> = table.ordered(OrderField::SortOrder).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["alpha", "zeta", "beta"]);
    }

    #[test]
    fn clear_drops_rows_and_indexes() {
        let mut tables = Tables::default();
        tables.entries.insert(entry("a", "food"));
        tables.categories.insert(category("food", 1));

        tables.clear(Collection::Entries);
        assert_eq!(tables.len(Collection::Entries), 0);
        assert!(tables.entries.lookup(IndexField::CategoryId, "food").is_empty());
        assert_eq!(tables.len(Collection::Categories), 1);
    }
}
