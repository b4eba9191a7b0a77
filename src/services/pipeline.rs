use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::builder::{RecordBuilder, VocabularyDefaults};
use super::dataset;
use super::ids::{scheme_for, IdAllocator};
use super::summary::{self, DatasetSummary};
use super::validate::{self, Issue};
use crate::error::Result;
use crate::model::batch::{Batch, BatchContent, DatasetKind};

pub struct AppendOptions {
    /// Stamp used when the batch doesn't pin its own `createdAt`.
    pub now: DateTime<Utc>,
    pub dry_run: bool,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            now: Utc::now(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppendReport {
    pub batch: String,
    pub dataset: PathBuf,
    pub before: usize,
    pub added: usize,
    pub after: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_new_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_new_id: Option<String>,

    pub dry_run: bool,
    pub summary: DatasetSummary,
}

/// Builds every record of `batch` with ids following `existing`.
///
/// Nothing is returned unless all records pass validation.
pub fn build_records(existing: &[Value], batch: &Batch, now: DateTime<Utc>) -> Result<Vec<Value>> {
    let scheme = scheme_for(batch.kind());
    let mut ids = IdAllocator::after(existing, scheme)?;
    let builder = RecordBuilder::new(batch.created_at.unwrap_or(now));

    debug!(
        "building {} {} records from {} (next id {}, createdAt {})",
        batch.len(),
        batch.kind().as_str(),
        batch.name,
        ids.peek().unwrap_or_default(),
        builder.created_at()
    );

    let mut out: Vec<Value> = Vec::with_capacity(batch.len());

    match &batch.content {
        BatchContent::Vocabulary {
            level,
            with_audio,
            entries,
        } => {
            let defaults = VocabularyDefaults {
                level: *level,
                with_audio: *with_audio,
            };
            for draft in entries {
                let record = builder.vocabulary(ids.allocate()?, draft, defaults)?;
                out.push(serde_json::to_value(record)?);
            }
        }
        BatchContent::Passages { passages } => {
            for draft in passages {
                let record = builder.passage(ids.allocate()?, draft)?;
                out.push(serde_json::to_value(record)?);
            }
        }
    }

    Ok(out)
}

/// Load, allocate, build, merge and write one batch into the dataset at `path`.
pub fn append_batch(path: &Path, batch: &Batch, opts: &AppendOptions) -> Result<AppendReport> {
    let original = dataset::load(path)?;
    let before = original.len();
    info!("{}: {} records before append", path.display(), before);

    let new_records = build_records(&original, batch, opts.now)?;
    let added = new_records.len();
    let first_new_id = new_records.first().and_then(record_id);
    let last_new_id = new_records.last().and_then(record_id);

    let merged = dataset::merge(original, new_records);

    if opts.dry_run {
        info!("dry run: {} would grow to {} records", path.display(), merged.len());
    } else {
        dataset::save(path, &merged)?;
        info!("appended {} records from {} to {}", added, batch.name, path.display());
    }

    Ok(AppendReport {
        batch: batch.name.clone(),
        dataset: path.to_path_buf(),
        before,
        added,
        after: merged.len(),
        first_new_id,
        last_new_id,
        dry_run: opts.dry_run,
        summary: summary::summarize(batch.kind(), &merged),
    })
}

/// Structural check of an existing dataset file.
pub fn check(kind: DatasetKind, path: &Path) -> Result<Vec<Issue>> {
    let records = dataset::load(path)?;
    let issues = validate::run(kind, &records);
    info!(
        "{}: {} records, {} issues",
        path.display(),
        records.len(),
        issues.len()
    );
    Ok(issues)
}

pub fn stats(kind: DatasetKind, path: &Path) -> Result<DatasetSummary> {
    let records = dataset::load(path)?;
    Ok(summary::summarize(kind, &records))
}

fn record_id(v: &Value) -> Option<String> {
    v.get("id").and_then(|id| id.as_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::services::batches;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn every_embedded_batch_builds_cleanly() {
        for name in batches::names() {
            let batch = batches::embedded(name).unwrap();
            let records = build_records(&[], &batch, at()).unwrap();
            assert_eq!(records.len(), batch.len(), "{name}");
        }
    }

    #[test]
    fn pinned_timestamp_wins_over_run_time() {
        let batch = batches::embedded("daily-core").unwrap();
        let records = build_records(&[], &batch, at()).unwrap();
        assert_eq!(records[0]["createdAt"], json!("2024-01-22T00:00:00.000Z"));
    }

    #[test]
    fn passages_continue_the_prefixed_sequence() {
        let existing: Vec<Value> = (1..=10)
            .map(|n| json!({ "id": format!("reading_{n:03}") }))
            .collect();
        let batch = batches::embedded("reading-practical").unwrap();
        let records = build_records(&existing, &batch, at()).unwrap();

        assert_eq!(records[0]["id"], json!("reading_011"));
        assert_eq!(records[9]["id"], json!("reading_020"));
        assert_eq!(records[0]["createdAt"], json!("2025-03-01T09:30:00.000Z"));
    }

    #[test]
    fn wrong_scheme_in_existing_data_aborts_before_building() {
        let existing = vec![json!({ "id": "1" })];
        let batch = batches::embedded("reading-practical").unwrap();
        assert!(matches!(
            build_records(&existing, &batch, at()),
            Err(CoreError::InvalidId { .. })
        ));
    }
}
