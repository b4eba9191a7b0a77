use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use super::validate::{self, Severity};
use crate::error::{CoreError, Result};
use crate::model::batch::DatasetKind;
use crate::model::category::Level;
use crate::model::passage::{PassageDraft, Question, ReadingPassageRecord};
use crate::model::vocabulary::{VocabularyDraft, VocabularyRecord};

/// `2024-01-22T00:00:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn audio_path(id: &str) -> String {
    format!("assets/audio/words/{id}.mp3")
}

/// Per-batch settings applied to every vocabulary draft.
#[derive(Debug, Clone, Copy, Default)]
pub struct VocabularyDefaults {
    pub level: Option<Level>,
    pub with_audio: bool,
}

/// Turns drafts into complete records sharing one creation timestamp.
pub struct RecordBuilder {
    created_at: String,
}

impl RecordBuilder {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at: format_timestamp(created_at),
        }
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn vocabulary(
        &self,
        id: String,
        draft: &VocabularyDraft,
        defaults: VocabularyDefaults,
    ) -> Result<VocabularyRecord> {
        let level = draft.level.or(defaults.level).ok_or_else(|| CoreError::Validation {
            record: id.clone(),
            issues: vec![format!("{}: no level given and the batch has no default", draft.term)],
        })?;

        let audio_url = defaults.with_audio.then(|| audio_path(&id));

        let record = VocabularyRecord {
            id,
            term: draft.term.trim().to_string(),
            translation: draft.translation.trim().to_string(),
            secondary_translation: draft.secondary_translation.trim().to_string(),
            pronunciation: draft.pronunciation.trim().to_string(),
            category: draft.category,
            level,
            created_at: self.created_at.clone(),
            examples: draft.examples.clone(),
            audio_url,
            image_url: None,
        };

        ensure_valid(DatasetKind::Vocabulary, &record.id, &record)?;
        Ok(record)
    }

    pub fn passage(&self, id: String, draft: &PassageDraft) -> Result<ReadingPassageRecord> {
        let questions = draft
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| Question {
                id: format!("q{}", i + 1),
                kind: q.kind,
                question: q.question.clone(),
                question_italian: q.question_italian.clone(),
                options: q.options.clone(),
                answer: q.answer.clone(),
                explanation: q.explanation.clone(),
            })
            .collect();

        let record = ReadingPassageRecord {
            id,
            title: draft.title.trim().to_string(),
            translated_title: draft.translated_title.trim().to_string(),
            level: draft.level,
            category: draft.category,
            content: draft.content.clone(),
            word_count: draft.word_count,
            estimated_minutes: draft.estimated_minutes,
            questions,
            created_at: self.created_at.clone(),
        };

        ensure_valid(DatasetKind::Passages, &record.id, &record)?;
        Ok(record)
    }
}

/// Rejects a freshly built record that would break the dataset schema.
fn ensure_valid<T: Serialize>(kind: DatasetKind, id: &str, record: &T) -> Result<()> {
    let value: Value = serde_json::to_value(record)?;

    let errors: Vec<String> = validate::record_issues(kind, &value)
        .into_iter()
        .filter(|i| i.severity == Severity::Error)
        .map(|i| format!("{}: {}", i.code, i.message))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation {
            record: id.to_string(),
            issues: errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::Category;
    use crate::model::passage::{QuestionDraft, QuestionKind};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 22, 0, 0, 0).unwrap()
    }

    fn draft(term: &str) -> VocabularyDraft {
        VocabularyDraft {
            term: term.to_string(),
            translation: "红色".to_string(),
            secondary_translation: "red".to_string(),
            pronunciation: "ˈrosso".to_string(),
            category: Category::Colors,
            level: None,
            examples: vec!["La mela è rossa.".to_string(), "Mi piace il rosso.".to_string()],
        }
    }

    fn passage_draft(answer: &str) -> PassageDraft {
        PassageDraft {
            title: "Al cinema".to_string(),
            translated_title: "电影院海报".to_string(),
            level: Level::A1,
            category: Category::PracticalTexts,
            content: "CINEMA ROMA - PROGRAMMA DEL WEEKEND".to_string(),
            word_count: 96,
            estimated_minutes: 2,
            questions: vec![
                QuestionDraft {
                    kind: QuestionKind::Choice,
                    question: "几点开始？".to_string(),
                    question_italian: "A che ora inizia?".to_string(),
                    options: vec!["15:00".to_string(), "16:00".to_string()],
                    answer: "15:00".to_string(),
                    explanation: String::new(),
                },
                QuestionDraft {
                    kind: QuestionKind::TrueFalse,
                    question: "电影院周一关门。".to_string(),
                    question_italian: "Il cinema è chiuso il lunedì.".to_string(),
                    options: vec!["真".to_string(), "假".to_string()],
                    answer: answer.to_string(),
                    explanation: String::new(),
                },
            ],
        }
    }

    #[test]
    fn timestamp_has_millis_and_zulu() {
        assert_eq!(format_timestamp(at()), "2024-01-22T00:00:00.000Z");
    }

    #[test]
    fn vocabulary_record_is_complete() {
        let builder = RecordBuilder::new(at());
        let defaults = VocabularyDefaults {
            level: Some(Level::A1),
            with_audio: true,
        };
        let record = builder.vocabulary("3".to_string(), &draft("rosso"), defaults).unwrap();

        assert_eq!(record.id, "3");
        assert_eq!(record.level, Level::A1);
        assert_eq!(record.created_at, "2024-01-22T00:00:00.000Z");
        assert_eq!(record.audio_url.as_deref(), Some("assets/audio/words/3.mp3"));
        assert_eq!(record.examples.len(), 2);

        let v = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "id", "italian", "chinese", "english", "pronunciation", "category", "level",
                "createdAt", "examples", "audioUrl"
            ]
        );
    }

    #[test]
    fn entry_level_overrides_batch_default() {
        let builder = RecordBuilder::new(at());
        let mut d = draft("salato");
        d.level = Some(Level::A2);
        let defaults = VocabularyDefaults {
            level: Some(Level::A1),
            with_audio: false,
        };
        let record = builder.vocabulary("1".to_string(), &d, defaults).unwrap();
        assert_eq!(record.level, Level::A2);
        assert!(record.audio_url.is_none());
    }

    #[test]
    fn missing_level_is_rejected() {
        let builder = RecordBuilder::new(at());
        let err = builder
            .vocabulary("1".to_string(), &draft("rosso"), VocabularyDefaults::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn empty_examples_are_rejected() {
        let builder = RecordBuilder::new(at());
        let mut d = draft("rosso");
        d.examples.clear();
        let defaults = VocabularyDefaults {
            level: Some(Level::A1),
            with_audio: false,
        };
        match builder.vocabulary("1".to_string(), &d, defaults) {
            Err(CoreError::Validation { record, issues }) => {
                assert_eq!(record, "1");
                assert!(issues[0].starts_with("EMPTY_EXAMPLES"));
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn passage_questions_get_sequential_ids() {
        let builder = RecordBuilder::new(at());
        let record = builder
            .passage("reading_012".to_string(), &passage_draft("假"))
            .unwrap();

        let ids: Vec<&str> = record.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2"]);
        assert!(record.questions.iter().all(|q| q.options.contains(&q.answer)));
    }

    #[test]
    fn passage_with_answer_outside_options_is_rejected() {
        let builder = RecordBuilder::new(at());
        let err = builder
            .passage("reading_012".to_string(), &passage_draft("forse"))
            .unwrap_err();
        assert!(err.to_string().contains("ANSWER_NOT_IN_OPTIONS"));
    }
}
