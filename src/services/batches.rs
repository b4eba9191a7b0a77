use std::fs;
use std::path::Path;

use serde::Serialize;

use super::encoding;
use crate::error::{CoreError, Result};
use crate::model::batch::{Batch, DatasetKind};

const EMBEDDED: &[(&str, &str)] = &[
    ("daily-core", include_str!("../../data/batches/daily-core.json")),
    ("a1-essential", include_str!("../../data/batches/a1-essential.json")),
    ("a1-basics", include_str!("../../data/batches/a1-basics.json")),
    ("a2-topics", include_str!("../../data/batches/a2-topics.json")),
    ("reading-practical", include_str!("../../data/batches/reading-practical.json")),
];

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BatchInfo {
    pub name: String,
    pub kind: DatasetKind,
    pub entries: usize,
    pub description: String,
}

pub fn names() -> impl Iterator<Item = &'static str> {
    EMBEDDED.iter().map(|(name, _)| *name)
}

fn parse(origin: &Path, text: &str) -> Result<Batch> {
    serde_json::from_str(text).map_err(|e| CoreError::Parse {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })
}

/// A batch compiled into the binary.
pub fn embedded(name: &str) -> Result<Batch> {
    let (_, text) = EMBEDDED
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| CoreError::UnknownBatch(name.to_string()))?;

    parse(Path::new(&format!("data/batches/{name}.json")), text)
}

/// A batch authored outside the binary.
pub fn from_file(path: &Path) -> Result<Batch> {
    if !path.exists() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    let text = encoding::decode_dataset(path, fs::read(path)?)?;
    parse(path, &text)
}

pub fn list() -> Result<Vec<BatchInfo>> {
    names()
        .map(|name| {
            let batch = embedded(name)?;
            Ok(BatchInfo {
                name: batch.name.clone(),
                kind: batch.kind(),
                entries: batch.len(),
                description: batch.description.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_embedded_batch_parses_and_matches_its_name() {
        for name in names() {
            let batch = embedded(name).unwrap();
            assert_eq!(batch.name, name);
            assert!(!batch.is_empty(), "{name} is empty");
        }
    }

    #[test]
    fn catalog_lists_both_kinds() {
        let infos = list().unwrap();
        assert_eq!(infos.len(), EMBEDDED.len());
        assert!(infos.iter().any(|i| i.kind == DatasetKind::Vocabulary));
        assert!(infos.iter().any(|i| i.kind == DatasetKind::Passages));
    }

    #[test]
    fn unknown_name_is_reported() {
        assert!(matches!(embedded("b2-advanced"), Err(CoreError::UnknownBatch(_))));
    }

    #[test]
    fn missing_batch_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(matches!(from_file(&path), Err(CoreError::NotFound(_))));
    }
}
