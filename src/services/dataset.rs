use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde_json::Value;
use tracing::{debug, warn};

use super::encoding;
use crate::error::{CoreError, Result};

/// Reads a dataset file: a JSON array of records, file order preserved.
///
/// A missing file is an error rather than an empty dataset, otherwise the
/// following write would silently drop whatever the file should have held.
pub fn load(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let text = encoding::decode_dataset(path, bytes)?;

    let root: Value = serde_json::from_str(&text).map_err(|e| CoreError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match root {
        Value::Array(records) => {
            debug!("loaded {} records from {}", records.len(), path.display());
            Ok(records)
        }
        other => Err(CoreError::Parse {
            path: path.to_path_buf(),
            message: format!("expected a JSON array at the root, found {}", type_name(&other)),
        }),
    }
}

/// Existing records first, untouched and in order, then the new ones.
pub fn merge(original: Vec<Value>, new_records: Vec<Value>) -> Vec<Value> {
    let mut out = original;
    out.reserve(new_records.len());
    out.extend(new_records);
    out
}

/// Serializes the full dataset and replaces `path` with it.
pub fn save(path: &Path, records: &[Value]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// Writes to a sibling temporary file and renames it over `path`, so the
/// target is either the old content or the new content, never a prefix.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| write_failure(path, e))?;
        }
    }

    let written = File::create(&tmp).and_then(|mut f| {
        f.write_all(bytes)?;
        f.sync_all()
    });

    if let Err(e) = written {
        discard(&tmp);
        return Err(write_failure(path, e));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        discard(&tmp);
        return Err(write_failure(path, e));
    }

    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "dataset".to_string(),
    };
    let suffix: u32 = rand::thread_rng().gen();
    path.with_file_name(format!(".{file_name}.{suffix:08x}.tmp"))
}

fn discard(tmp: &Path) {
    if tmp.exists() {
        if let Err(e) = fs::remove_file(tmp) {
            warn!("failed to remove temporary file {}: {e}", tmp.display());
        }
    }
}

fn write_failure(path: &Path, source: std::io::Error) -> CoreError {
    CoreError::WriteFailure {
        path: path.to_path_buf(),
        source,
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
