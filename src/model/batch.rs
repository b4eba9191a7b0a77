use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::Level;
use super::passage::PassageDraft;
use super::vocabulary::VocabularyDraft;

/// Which dataset file a record (or a batch) belongs to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Vocabulary,
    Passages,
}

impl DatasetKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            DatasetKind::Vocabulary => "sample_words.json",
            DatasetKind::Passages => "reading_passages.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Vocabulary => "vocabulary",
            DatasetKind::Passages => "passages",
        }
    }
}

/// A named set of hand-authored entries appended in one run.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Pins the creation timestamp of every record in the batch.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub content: BatchContent,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BatchContent {
    Vocabulary {
        /// Level for entries that don't carry their own.
        #[serde(default)]
        level: Option<Level>,

        #[serde(default, rename = "withAudio")]
        with_audio: bool,

        entries: Vec<VocabularyDraft>,
    },
    Passages {
        passages: Vec<PassageDraft>,
    },
}

impl Batch {
    pub fn kind(&self) -> DatasetKind {
        match self.content {
            BatchContent::Vocabulary { .. } => DatasetKind::Vocabulary,
            BatchContent::Passages { .. } => DatasetKind::Passages,
        }
    }

    pub fn len(&self) -> usize {
        match &self.content {
            BatchContent::Vocabulary { entries, .. } => entries.len(),
            BatchContent::Passages { passages } => passages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
