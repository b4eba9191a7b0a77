//! Converts the TTS voice-embedding archive (`voices-v1.0.bin`, a NumPy
//! `.npz`) into the `voices.json` file the app's speech engine loads.

pub mod fetch;
pub mod npy;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use super::dataset;
use crate::error::Result;

pub const VOICES_URL: &str =
    "https://github.com/thewh1teagle/kokoro-onnx/releases/download/model-files-v1.0/voices-v1.0.bin";

/// Italian voices plus one general fallback.
pub const DEFAULT_VOICES: &[&str] = &["if_sara", "im_nicola", "af_heart"];

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub url: String,
    pub cache: PathBuf,
    pub output: PathBuf,
    pub voices: Vec<String>,
    pub sha256: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct VoiceShape {
    pub name: String,
    pub shape: Vec<usize>,
}

#[derive(Debug)]
pub struct Extraction {
    pub voices: Map<String, Value>,
    pub available: Vec<String>,
    pub exported: Vec<VoiceShape>,
    pub missing: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvertReport {
    pub output: PathBuf,
    pub cache: PathBuf,
    pub downloaded: bool,
    pub sha256: String,
    pub asset_bytes: u64,
    pub available: Vec<String>,
    pub exported: Vec<VoiceShape>,
    pub missing: Vec<String>,
    pub bytes_written: u64,
}

/// Pulls the wanted voices out of an `.npz` archive. Names absent from the
/// archive are reported and skipped.
pub fn extract_voices<R: Read + Seek>(reader: R, wanted: &[String]) -> Result<Extraction> {
    let mut archive = ZipArchive::new(reader)?;

    let mut available: Vec<String> = archive
        .file_names()
        .filter_map(|n| n.strip_suffix(".npy"))
        .map(str::to_string)
        .collect();
    available.sort();
    info!("available voices: {}", available.join(", "));

    let mut voices = Map::new();
    let mut exported = Vec::new();
    let mut missing = Vec::new();

    for name in wanted {
        let member = format!("{name}.npy");
        let mut bytes = Vec::new();
        match archive.by_name(&member) {
            Ok(mut file) => {
                file.read_to_end(&mut bytes)?;
            }
            Err(ZipError::FileNotFound) => {
                warn!("{name}: NOT FOUND");
                missing.push(name.clone());
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        let array = npy::parse(&bytes)?;
        info!("{name}: shape {:?}", array.shape);
        voices.insert(name.clone(), array.to_json());
        exported.push(VoiceShape {
            name: name.clone(),
            shape: array.shape,
        });
    }

    Ok(Extraction {
        voices,
        available,
        exported,
        missing,
    })
}

/// fetch → select → convert → write.
pub fn convert(opts: &ConvertOptions) -> Result<ConvertReport> {
    let client = fetch::http_client()?;
    let cached = fetch::ensure_cached(&client, &opts.url, &opts.cache, opts.sha256.as_deref())?;

    info!("loading voices from {}", cached.path.display());
    let file = File::open(&cached.path)?;
    let extraction = extract_voices(BufReader::new(file), &opts.voices)?;

    if extraction.exported.is_empty() {
        warn!("none of the requested voices were found; writing an empty voice table");
    }

    let json = serde_json::to_string(&Value::Object(extraction.voices))?;
    dataset::write_atomic(&opts.output, json.as_bytes())?;

    let bytes_written = json.len() as u64;
    info!(
        "saved {} ({:.2} MB)",
        opts.output.display(),
        bytes_written as f64 / 1024.0 / 1024.0
    );

    Ok(ConvertReport {
        output: opts.output.clone(),
        cache: cached.path,
        downloaded: cached.downloaded,
        sha256: cached.sha256,
        asset_bytes: cached.bytes,
        available: extraction.available,
        exported: extraction.exported,
        missing: extraction.missing,
        bytes_written,
    })
}
