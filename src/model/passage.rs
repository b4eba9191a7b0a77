use serde::{Deserialize, Serialize};

use super::category::{Category, Level};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Choice,
    TrueFalse,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: QuestionKind,

    /// Prompt in the learner's language.
    pub question: String,

    pub question_italian: String,

    pub options: Vec<String>,

    pub answer: String,

    pub explanation: String,
}

/// One reading passage as stored in `reading_passages.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPassageRecord {
    pub id: String,

    pub title: String,

    #[serde(rename = "titleChinese")]
    pub translated_title: String,

    pub level: Level,

    pub category: Category,

    pub content: String,

    pub word_count: u32,

    pub estimated_minutes: u32,

    pub questions: Vec<Question>,

    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    #[serde(rename = "type")]
    pub kind: QuestionKind,

    pub question: String,

    pub question_italian: String,

    pub options: Vec<String>,

    pub answer: String,

    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PassageDraft {
    pub title: String,

    #[serde(rename = "titleChinese")]
    pub translated_title: String,

    pub level: Level,

    pub category: Category,

    pub content: String,

    pub word_count: u32,

    pub estimated_minutes: u32,

    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}
