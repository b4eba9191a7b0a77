use serde::{Deserialize, Serialize};

use super::category::{Category, Level};

/// One word as stored in `sample_words.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyRecord {
    pub id: String,

    #[serde(rename = "italian")]
    pub term: String,

    #[serde(rename = "chinese")]
    pub translation: String,

    #[serde(rename = "english")]
    pub secondary_translation: String,

    pub pronunciation: String,

    pub category: Category,

    pub level: Level,

    pub created_at: String,

    pub examples: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Hand-authored input for one word; id, timestamp and media paths are
/// filled in by the builder.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VocabularyDraft {
    #[serde(rename = "italian")]
    pub term: String,

    #[serde(rename = "chinese")]
    pub translation: String,

    #[serde(rename = "english")]
    pub secondary_translation: String,

    pub pronunciation: String,

    pub category: Category,

    #[serde(default)]
    pub level: Option<Level>,

    #[serde(default)]
    pub examples: Vec<String>,
}
