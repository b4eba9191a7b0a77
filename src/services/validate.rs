use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::scheme_for;
use crate::model::batch::DatasetKind;
use crate::model::category::{Category, Level};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Issue {
    pub record_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    pub code: String,
    pub severity: Severity,
    pub message: String,
}

const VOCABULARY_TEXT_FIELDS: &[&str] =
    &["italian", "chinese", "english", "pronunciation", "createdAt"];
const PASSAGE_TEXT_FIELDS: &[&str] = &["title", "titleChinese", "content", "createdAt"];
const QUESTION_TEXT_FIELDS: &[&str] = &["id", "question", "questionItalian", "answer"];

struct Collector<'a> {
    record_id: &'a str,
    index: Option<usize>,
    issues: Vec<Issue>,
}

impl Collector<'_> {
    fn push(&mut self, severity: Severity, code: &str, message: impl Into<String>) {
        self.issues.push(Issue {
            record_id: self.record_id.to_string(),
            index: self.index,
            code: code.to_string(),
            severity,
            message: message.into(),
        });
    }
}

fn text<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(|v| v.as_str())
}

fn record_id(record: &Value) -> String {
    match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Checks one record in isolation against the schema of `kind`.
pub fn record_issues(kind: DatasetKind, record: &Value) -> Vec<Issue> {
    check_record(kind, record, None)
}

fn check_record(kind: DatasetKind, record: &Value, index: Option<usize>) -> Vec<Issue> {
    let id = record_id(record);
    let mut c = Collector {
        record_id: &id,
        index,
        issues: Vec::new(),
    };

    if !record.is_object() {
        c.push(Severity::Error, "NOT_AN_OBJECT", "record is not a JSON object");
        return c.issues;
    }

    if id.is_empty() {
        c.push(Severity::Error, "MISSING_ID", "record has no id");
    } else if scheme_for(kind).extract(&id).is_none() {
        c.push(
            Severity::Error,
            "INVALID_ID",
            format!("id {id:?} does not follow the {} scheme", scheme_for(kind).describe()),
        );
    }

    let required = match kind {
        DatasetKind::Vocabulary => VOCABULARY_TEXT_FIELDS,
        DatasetKind::Passages => PASSAGE_TEXT_FIELDS,
    };
    for field in required {
        match text(record, field) {
            Some(s) if !s.trim().is_empty() => {}
            _ => c.push(Severity::Error, "MISSING_FIELD", format!("{field} is missing or empty")),
        }
    }

    match text(record, "level") {
        Some(l) if l.parse::<Level>().is_ok() => {}
        Some(l) => c.push(
            Severity::Warning,
            "UNKNOWN_LEVEL",
            format!("level {l:?} is not a CEFR tag"),
        ),
        None => c.push(Severity::Error, "MISSING_FIELD", "level is missing"),
    }

    match text(record, "category") {
        Some(label) => match Category::from_label(label) {
            Some(cat) if cat.label() != label => c.push(
                Severity::Warning,
                "NON_CANONICAL_CATEGORY",
                format!("category {label:?} is spelled {:?} elsewhere", cat.label()),
            ),
            Some(_) => {}
            None => c.push(
                Severity::Warning,
                "UNKNOWN_CATEGORY",
                format!("category {label:?} is not a known topic"),
            ),
        },
        None => c.push(Severity::Error, "MISSING_FIELD", "category is missing"),
    }

    match kind {
        DatasetKind::Vocabulary => check_examples(record, &mut c),
        DatasetKind::Passages => check_passage(record, &mut c),
    }

    c.issues
}

fn check_examples(record: &Value, c: &mut Collector<'_>) {
    match record.get("examples").and_then(|v| v.as_array()) {
        Some(examples) if examples.is_empty() => {
            c.push(Severity::Error, "EMPTY_EXAMPLES", "examples list is empty")
        }
        Some(examples) => {
            if examples.iter().any(|e| e.as_str().map_or(true, |s| s.trim().is_empty())) {
                c.push(
                    Severity::Error,
                    "BLANK_EXAMPLE",
                    "examples contain a blank or non-text entry",
                );
            }
        }
        None => c.push(Severity::Error, "MISSING_FIELD", "examples is missing"),
    }
}

fn check_passage(record: &Value, c: &mut Collector<'_>) {
    for field in ["wordCount", "estimatedMinutes"] {
        match record.get(field).and_then(|v| v.as_u64()) {
            Some(n) if n > 0 => {}
            _ => c.push(
                Severity::Error,
                "MISSING_FIELD",
                format!("{field} must be a positive integer"),
            ),
        }
    }

    let questions = match record.get("questions").and_then(|v| v.as_array()) {
        Some(q) => q,
        None => {
            c.push(Severity::Error, "MISSING_FIELD", "questions is missing");
            return;
        }
    };

    if questions.is_empty() {
        c.push(Severity::Error, "NO_QUESTIONS", "passage has no questions");
    }

    for (qi, q) in questions.iter().enumerate() {
        let qn = qi + 1;

        for field in QUESTION_TEXT_FIELDS {
            if text(q, field).map_or(true, |s| s.trim().is_empty()) {
                c.push(
                    Severity::Error,
                    "MISSING_FIELD",
                    format!("question {qn}: {field} is missing or empty"),
                );
            }
        }

        let options: Vec<&str> = q
            .get("options")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|o| o.as_str()).collect())
            .unwrap_or_default();

        if options.is_empty() {
            c.push(Severity::Error, "NO_OPTIONS", format!("question {qn} has no options"));
        }

        if let Some(answer) = text(q, "answer") {
            if !options.is_empty() && !options.contains(&answer) {
                c.push(
                    Severity::Error,
                    "ANSWER_NOT_IN_OPTIONS",
                    format!("question {qn}: answer {answer:?} is not one of the options"),
                );
            }
        }

        match text(q, "type") {
            Some("choice") => {
                if options.len() == 1 {
                    c.push(
                        Severity::Warning,
                        "SINGLE_OPTION",
                        format!("question {qn} offers a single option"),
                    );
                }
            }
            Some("true_false") => {
                if options.len() != 2 {
                    c.push(
                        Severity::Error,
                        "TRUE_FALSE_OPTIONS",
                        format!("question {qn} is true/false but has {} options", options.len()),
                    );
                }
            }
            Some(other) => c.push(
                Severity::Error,
                "UNKNOWN_QUESTION_TYPE",
                format!("question {qn} has unknown type {other:?}"),
            ),
            None => c.push(
                Severity::Error,
                "MISSING_FIELD",
                format!("question {qn}: type is missing"),
            ),
        }
    }
}

/// Checks a whole dataset: every record on its own, then duplicates across records.
pub fn run(kind: DatasetKind, records: &[Value]) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();

    for (i, record) in records.iter().enumerate() {
        issues.extend(check_record(kind, record, Some(i)));
    }

    let mut seen_ids: HashMap<String, usize> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        let id = record_id(record);
        if id.is_empty() {
            continue;
        }
        if let Some(first) = seen_ids.get(&id) {
            issues.push(Issue {
                record_id: id.clone(),
                index: Some(i),
                code: "DUPLICATE_ID".to_string(),
                severity: Severity::Error,
                message: format!("id already used by record {first}"),
            });
        } else {
            seen_ids.insert(id, i);
        }
    }

    let key_field = match kind {
        DatasetKind::Vocabulary => "italian",
        DatasetKind::Passages => "title",
    };
    let mut seen_keys: HashMap<String, String> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        let Some(key) = text(record, key_field) else {
            continue;
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let id = record_id(record);
        if let Some(first_id) = seen_keys.get(&key) {
            issues.push(Issue {
                record_id: id,
                index: Some(i),
                code: "DUPLICATE_TERM".to_string(),
                severity: Severity::Warning,
                message: format!("{key_field} {key:?} already appears in record {first_id}"),
            });
        } else {
            seen_keys.insert(key, id);
        }
    }

    issues
}

pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}
