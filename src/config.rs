use std::path::{Path, PathBuf};

use crate::model::batch::DatasetKind;
use crate::services::voices::{ConvertOptions, DEFAULT_VOICES, VOICES_URL};

pub const DATA_DIR_ENV: &str = "LESSICO_DATA_DIR";
pub const VOICES_URL_ENV: &str = "LESSICO_VOICES_URL";
pub const VOICES_CACHE_ENV: &str = "LESSICO_VOICES_CACHE";

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Where the app's content lives. Explicit values win over the environment,
/// which wins over the defaults relative to the working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
}

impl Settings {
    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir
            .or_else(|| env_path(DATA_DIR_ENV))
            .unwrap_or_else(|| current_dir().join("assets").join("data"));
        Self { data_dir }
    }

    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn dataset_path(&self, kind: DatasetKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    /// Picks the explicit dataset path if one was given.
    pub fn dataset_or(&self, kind: DatasetKind, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.dataset_path(kind))
    }
}

/// Voice converter options with every unset value filled from the
/// environment or the built-in defaults.
pub fn voice_options(
    url: Option<String>,
    cache: Option<PathBuf>,
    output: Option<PathBuf>,
    voices: Vec<String>,
    sha256: Option<String>,
) -> ConvertOptions {
    let url = url
        .or_else(|| std::env::var(VOICES_URL_ENV).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| VOICES_URL.to_string());

    let cache = cache
        .or_else(|| env_path(VOICES_CACHE_ENV))
        .unwrap_or_else(|| std::env::temp_dir().join("voices-v1.0.bin"));

    let output = output.unwrap_or_else(|| current_dir().join("assets").join("voices.json"));

    let voices = if voices.is_empty() {
        DEFAULT_VOICES.iter().map(|v| v.to_string()).collect()
    } else {
        voices
    };

    ConvertOptions {
        url,
        cache,
        output,
        voices,
        sha256: sha256.filter(|s| !s.trim().is_empty()),
    }
}
