//! Property-based test generators using proptest.
//!
//! Record ids produced by the snapshot strategies are unique within their
//! collection, matching what the origin serves.

use lexicache_store::{Category, Conversation, DatasetSnapshot, Entry, SnapshotTables};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for record ids.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,15}").expect("Invalid regex")
}

/// Strategy for category ids drawn from a small pool, so records share
/// categories.
pub fn category_id_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["greetings", "food", "travel", "numbers", "family"])
        .prop_map(str::to_string)
}

/// Strategy for short free text, Korean included.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z가-힣 ]{0,24}").expect("Invalid regex")
}

/// Strategy for entries with the given id.
pub fn entry_strategy(id: String) -> impl Strategy<Value = Entry> {
    (
        text_strategy(),
        prop::option::of(text_strategy()),
        category_id_strategy(),
        prop::option::of(prop::sample::select(vec!["beginner", "intermediate", "advanced"])),
        prop::option::of(text_strategy()),
    )
        .prop_map(move |(korean, romanization, category_id, difficulty, word)| Entry {
            id: id.clone(),
            korean,
            romanization,
            part_of_speech: None,
            category_id,
            difficulty: difficulty.map(str::to_string),
            frequency: None,
            tags: None,
            translations: word.map(|w| serde_json::json!({ "en": w }).to_string()),
        })
}

/// Strategy for categories with the given id.
pub fn category_strategy(id: String) -> impl Strategy<Value = Category> {
    (text_strategy(), text_strategy(), -100i64..100).prop_map(move |(name_ko, name_en, sort_order)| {
        Category {
            id: id.clone(),
            name_ko,
            name_en,
            description_ko: None,
            description_en: None,
            icon: None,
            color: None,
            sort_order,
        }
    })
}

/// Strategy for conversations with the given id.
pub fn conversation_strategy(id: String) -> impl Strategy<Value = Conversation> {
    (prop::option::of(category_id_strategy()), text_strategy(), text_strategy()).prop_map(
        move |(category_id, title_ko, title_en)| Conversation {
            id: id.clone(),
            category_id,
            title_ko,
            title_en,
            dialogue: "[]".to_string(),
        },
    )
}

fn unique_ids(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(id_strategy(), 0..=max)
        .prop_map(|ids: BTreeSet<String>| ids.into_iter().collect())
}

/// Strategy for up to `max` entries with distinct ids.
pub fn entries_strategy(max: usize) -> impl Strategy<Value = Vec<Entry>> {
    unique_ids(max).prop_flat_map(|ids| ids.into_iter().map(entry_strategy).collect::<Vec<_>>())
}

/// Strategy for up to `max` categories with distinct ids.
pub fn categories_strategy(max: usize) -> impl Strategy<Value = Vec<Category>> {
    unique_ids(max).prop_flat_map(|ids| ids.into_iter().map(category_strategy).collect::<Vec<_>>())
}

/// Strategy for up to `max` conversations with distinct ids.
pub fn conversations_strategy(max: usize) -> impl Strategy<Value = Vec<Conversation>> {
    unique_ids(max)
        .prop_flat_map(|ids| ids.into_iter().map(conversation_strategy).collect::<Vec<_>>())
}

/// Strategy for snapshots with up to `max` records per collection.
pub fn snapshot_strategy(max: usize) -> impl Strategy<Value = DatasetSnapshot> {
    (
        1u64..1_000_000,
        entries_strategy(max),
        categories_strategy(max),
        conversations_strategy(max),
    )
        .prop_map(|(version, entries, categories, conversations)| {
            DatasetSnapshot::new(
                version,
                SnapshotTables {
                    entries,
                    categories,
                    conversations,
                },
            )
        })
}
