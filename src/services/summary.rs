use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::model::batch::DatasetKind;

/// CEFR guidance for the size of an A2 vocabulary.
pub const A2_TARGET_LOW: usize = 1000;
pub const A2_TARGET_HIGH: usize = 1200;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DatasetSummary {
    pub kind: DatasetKind,
    pub total: usize,
    pub by_level: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub a2_coverage: Option<Coverage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<ReadingTotals>,
}

/// Share of the A2 target reached, as a percentage range.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub words: usize,
    pub low_pct: f64,
    pub high_pct: f64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadingTotals {
    pub words: u64,
    pub questions: usize,
    pub minutes: u64,
}

fn label(record: &Value, field: &str) -> String {
    record
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "(none)".to_string())
}

fn id_of(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn summarize(kind: DatasetKind, records: &[Value]) -> DatasetSummary {
    let mut by_level: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();

    for r in records {
        *by_level.entry(label(r, "level")).or_insert(0) += 1;
        *by_category.entry(label(r, "category")).or_insert(0) += 1;
    }

    let a2_coverage = match kind {
        DatasetKind::Vocabulary => {
            let words = by_level.get("A2").copied().unwrap_or(0);
            Some(Coverage {
                words,
                low_pct: words as f64 / A2_TARGET_HIGH as f64 * 100.0,
                high_pct: words as f64 / A2_TARGET_LOW as f64 * 100.0,
            })
        }
        DatasetKind::Passages => None,
    };

    let reading = match kind {
        DatasetKind::Passages => Some(records.iter().fold(ReadingTotals::default(), |mut t, r| {
            t.words += r.get("wordCount").and_then(|v| v.as_u64()).unwrap_or(0);
            t.minutes += r.get("estimatedMinutes").and_then(|v| v.as_u64()).unwrap_or(0);
            t.questions += r
                .get("questions")
                .and_then(|v| v.as_array())
                .map_or(0, |q| q.len());
            t
        })),
        DatasetKind::Vocabulary => None,
    };

    DatasetSummary {
        kind,
        total: records.len(),
        by_level,
        by_category,
        first_id: records.first().and_then(id_of),
        last_id: records.last().and_then(id_of),
        a2_coverage,
        reading,
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} records: {}", self.kind.as_str(), self.total)?;

        if let (Some(first), Some(last)) = (&self.first_id, &self.last_id) {
            writeln!(f, "id range: {first} - {last}")?;
        }

        writeln!(f, "by level:")?;
        for (level, n) in &self.by_level {
            writeln!(f, "  {level}: {n}")?;
        }

        writeln!(f, "by category:")?;
        for (category, n) in &self.by_category {
            writeln!(f, "  {category}: {n}")?;
        }

        if let Some(c) = &self.a2_coverage {
            writeln!(
                f,
                "A2 coverage: {} words, {:.1}%-{:.1}% of the {}-{} word target",
                c.words, c.low_pct, c.high_pct, A2_TARGET_LOW, A2_TARGET_HIGH
            )?;
        }

        if let Some(r) = &self.reading {
            writeln!(
                f,
                "reading: {} words, {} questions, {} minutes",
                r.words, r.questions, r.minutes
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_levels_and_categories() {
        let records = vec![
            json!({"id": "1", "level": "A1", "category": "颜色"}),
            json!({"id": "2", "level": "A2", "category": "颜色"}),
            json!({"id": "3", "level": "A2", "category": "天气"}),
            json!({"id": "4"}),
        ];
        let s = summarize(DatasetKind::Vocabulary, &records);

        assert_eq!(s.total, 4);
        assert_eq!(s.by_level["A2"], 2);
        assert_eq!(s.by_level["(none)"], 1);
        assert_eq!(s.by_category["颜色"], 2);
        assert_eq!(s.first_id.as_deref(), Some("1"));
        assert_eq!(s.last_id.as_deref(), Some("4"));

        let c = s.a2_coverage.unwrap();
        assert_eq!(c.words, 2);
        assert!((c.high_pct - 0.2).abs() < 1e-9);
        assert!(s.reading.is_none());
    }

    #[test]
    fn reading_totals_add_up() {
        let records = vec![
            json!({"id": "reading_001", "level": "A1", "wordCount": 78, "estimatedMinutes": 2,
                   "questions": [{}, {}, {}]}),
            json!({"id": "reading_002", "level": "A2", "wordCount": 134, "estimatedMinutes": 3,
                   "questions": [{}, {}]}),
        ];
        let s = summarize(DatasetKind::Passages, &records);
        assert_eq!(
            s.reading,
            Some(ReadingTotals {
                words: 212,
                questions: 5,
                minutes: 5
            })
        );
        assert!(s.a2_coverage.is_none());
        assert!(s.to_string().contains("212 words, 5 questions, 5 minutes"));
    }

    #[test]
    fn empty_dataset_has_no_id_range() {
        let s = summarize(DatasetKind::Vocabulary, &[]);
        assert_eq!(s.total, 0);
        assert!(s.first_id.is_none());
        assert!(!s.to_string().contains("id range"));
    }
}
