//! Locale-aware views over stored records.
//!
//! Entries and conversations carry some of their content as embedded JSON
//! text. The helpers here decode it on demand. Malformed JSON never panics:
//! it is logged and treated as absent.

use crate::record::{Category, Conversation, Entry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Display languages of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Korean.
    Ko,
    /// English.
    #[default]
    En,
}

impl Locale {
    /// Two-letter language code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ko" => Ok(Self::Ko),
            "en" => Ok(Self::En),
            other => Err(format!("unknown locale {other:?} (expected ko or en)")),
        }
    }
}

/// Usage examples of a translation, served either keyed by level or as a
/// plain list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Examples {
    /// Examples keyed by name, e.g. `{"beginner": "...", "advanced": "..."}`.
    Map(BTreeMap<String, serde_json::Value>),
    /// An ordered list of examples.
    List(Vec<serde_json::Value>),
}

/// One locale's translation bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// Translated headword.
    pub word: String,
    /// Explanation of meaning and usage.
    #[serde(default)]
    pub explanation: String,
    /// Usage examples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Examples>,
    /// Variant forms, passed through as served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variations: Option<serde_json::Value>,
    /// Example dialogue, passed through as served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<serde_json::Value>,
}

// Older datasets store a bare string per locale instead of a bundle.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTranslation {
    Bundle(Translation),
    Word(String),
}

impl From<RawTranslation> for Translation {
    fn from(raw: RawTranslation) -> Self {
        match raw {
            RawTranslation::Bundle(t) => t,
            RawTranslation::Word(word) => Self {
                word,
                explanation: String::new(),
                examples: None,
                variations: None,
                dialogue: None,
            },
        }
    }
}

/// An entry resolved for one locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedEntry {
    /// Entry id.
    pub id: String,
    /// Korean headword.
    pub korean: String,
    /// Romanization, empty when unknown.
    pub romanization: String,
    /// Part of speech, `"noun"` when unknown.
    pub part_of_speech: String,
    /// Owning category.
    pub category_id: String,
    /// Decoded tags.
    pub tags: Vec<String>,
    /// Difficulty, `"beginner"` when unknown.
    pub difficulty: String,
    /// Frequency, if classified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    /// Whether the translation carries an example dialogue.
    pub has_dialogue: bool,
    /// The locale's translation.
    pub translation: Translation,
}

/// One line of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    /// Speaker label, e.g. `"A"`.
    pub speaker: String,
    /// What was said.
    pub text: String,
}

fn decode_embedded<T: serde::de::DeserializeOwned>(id: &str, field: &str, json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(id, field, error = %err, "malformed embedded JSON");
            None
        }
    }
}

impl Entry {
    /// Decoded tag list; empty when absent or malformed.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .and_then(|json| decode_embedded(&self.id, "tags", json))
            .unwrap_or_default()
    }

    /// Translation bundle for `locale`, if present and well-formed.
    #[must_use]
    pub fn translation(&self, locale: Locale) -> Option<Translation> {
        let json = self.translations.as_deref()?;
        let mut bundles: BTreeMap<String, serde_json::Value> =
            decode_embedded(&self.id, "translations", json)?;
        let raw = bundles.remove(locale.code())?;
        match serde_json::from_value::<RawTranslation>(raw) {
            Ok(raw) => Some(raw.into()),
            Err(err) => {
                warn!(id = %self.id, locale = %locale, error = %err, "malformed translation");
                None
            }
        }
    }

    /// The entry as shown in `locale`, or `None` without a translation.
    #[must_use]
    pub fn localize(&self, locale: Locale) -> Option<LocalizedEntry> {
        let translation = self.translation(locale)?;
        Some(LocalizedEntry {
            id: self.id.clone(),
            korean: self.korean.clone(),
            romanization: self.romanization.clone().unwrap_or_default(),
            part_of_speech: self.part_of_speech.clone().unwrap_or_else(|| "noun".into()),
            category_id: self.category_id.clone(),
            tags: self.tags(),
            difficulty: self.difficulty.clone().unwrap_or_else(|| "beginner".into()),
            frequency: self.frequency.clone(),
            has_dialogue: translation.dialogue.as_ref().is_some_and(|d| !d.is_null()),
            translation,
        })
    }
}

impl Category {
    /// Display name in `locale`.
    #[must_use]
    pub fn name(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ko => &self.name_ko,
            Locale::En => &self.name_en,
        }
    }

    /// Description in `locale`, empty when absent.
    #[must_use]
    pub fn description(&self, locale: Locale) -> &str {
        let text = match locale {
            Locale::Ko => self.description_ko.as_deref(),
            Locale::En => self.description_en.as_deref(),
        };
        text.unwrap_or_default()
    }

    /// Icon token, empty when absent.
    #[must_use]
    pub fn icon_or_default(&self) -> &str {
        self.icon.as_deref().unwrap_or_default()
    }

    /// Color token, `"blue"` when absent.
    #[must_use]
    pub fn color_or_default(&self) -> &str {
        self.color.as_deref().unwrap_or("blue")
    }
}

impl Conversation {
    /// Title in `locale`.
    #[must_use]
    pub fn title(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ko => &self.title_ko,
            Locale::En => &self.title_en,
        }
    }

    /// Decoded dialogue; empty when malformed.
    #[must_use]
    pub fn turns(&self) -> Vec<DialogueTurn> {
        decode_embedded(&self.id, "dialogue", &self.dialogue).unwrap_or_default()
    }
}
