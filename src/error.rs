use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid id {id:?} at index {index}: {reason}")]
    InvalidId {
        index: usize,
        id: String,
        reason: String,
    },

    #[error("failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("record {record} rejected: {}", .issues.join("; "))]
    Validation { record: String, issues: Vec<String> },

    #[error("unknown batch: {0}")]
    UnknownBatch(String),

    #[error("voice asset error: {0}")]
    Asset(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for CoreError {
    fn from(error: reqwest::Error) -> Self {
        CoreError::Network(error.to_string())
    }
}

impl From<zip::result::ZipError> for CoreError {
    fn from(error: zip::result::ZipError) -> Self {
        CoreError::Asset(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
